use serde::{Deserialize, Serialize};
use validator::Validate;

use super::dataset::RowId;
use super::session::SessionView;

/// Annotation stored in the "annotations" collection.
///
/// Problem, answers and feedback are denormalized so a record stays
/// auditable independently of later changes to the dataset files.
/// At most one record exists per `(teacher_name, dataset_name, row_index)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub teacher_name: String,
    pub dataset_name: String,
    pub row_index: RowId,
    pub problem: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub generated_feedback: String,
    pub relevancy: i32,
    pub accuracy: i32,
    pub motivation: i32,
    pub demotivation: i32,
    pub guidance: i32,
    pub tone_style: i32,
    pub teacher_comments: Option<String>,
    /// ISO-8601 submission time
    pub timestamp: String,
}

/// Six rubric ratings for one piece of feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RubricScores {
    #[validate(range(min = 1, max = 4, message = "relevancy must be between 1 and 4"))]
    pub relevancy: i32,

    #[validate(range(min = 0, max = 1, message = "accuracy must be 0 or 1"))]
    pub accuracy: i32,

    #[validate(range(min = 1, max = 3, message = "motivation must be between 1 and 3"))]
    pub motivation: i32,

    /// Lower is better
    #[validate(range(min = 1, max = 3, message = "demotivation must be between 1 and 3"))]
    pub demotivation: i32,

    #[validate(range(min = 1, max = 3, message = "guidance must be between 1 and 3"))]
    pub guidance: i32,

    #[validate(range(min = 1, max = 4, message = "tone_style must be between 1 and 4"))]
    pub tone_style: i32,
}

/// Request body for `POST /api/v1/sessions/{id}/annotations`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnnotationRequest {
    pub row_id: RowId,

    #[serde(flatten)]
    #[validate(nested)]
    pub scores: RubricScores,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Comments must be at most 5000 characters"))]
    pub teacher_comments: Option<String>,
}

impl SubmitAnnotationRequest {
    /// Trimmed comment; blank input counts as no comment
    pub fn normalized_comments(&self) -> Option<String> {
        self.teacher_comments
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// A new record was written
    Saved,
    /// The store already held a record for this row; counted as done
    AlreadyAnnotated,
}

impl SubmissionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionOutcome::Saved => "saved",
            SubmissionOutcome::AlreadyAnnotated => "already_annotated",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SubmissionOutcome::Saved => "Annotation saved successfully!",
            SubmissionOutcome::AlreadyAnnotated => {
                "This question was already annotated. Skipping to next question."
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitAnnotationResponse {
    pub outcome: SubmissionOutcome,
    pub message: String,
    pub session: SessionView,
}
