use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::dataset::{ProblemRow, RowId};
use super::progress::{Progress, ProgressState, ProgressSummary};

/// Per-teacher annotation context, created at login and dropped at logout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationSession {
    pub id: String,
    pub teacher_name: String,
    pub dataset_name: String,
    pub progress: Progress,
    /// Set when prior annotations could not be fetched and the session
    /// started from an empty annotated set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Teacher name must be between 1 and 200 characters"
    ))]
    pub teacher_name: String,

    #[validate(length(min = 1, message = "Dataset name is required"))]
    pub dataset_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SwitchDatasetRequest {
    #[validate(length(min = 1, message = "Dataset name is required"))]
    pub dataset_name: String,
}

/// Problem currently presented to the teacher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemView {
    pub row_id: RowId,
    /// 1-based position of the row in its dataset
    pub number: usize,
    pub problem: String,
    pub correct_answer: String,
    pub student_answer: String,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mistake_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<String>,
}

impl From<&ProblemRow> for ProblemView {
    fn from(row: &ProblemRow) -> Self {
        ProblemView {
            row_id: row.row_id,
            number: row.position + 1,
            problem: row.problem.clone(),
            correct_answer: row.correct_answer.clone(),
            student_answer: row.student_answer.clone(),
            feedback: row.feedback_text.clone(),
            knowledge_level: row.knowledge_level.clone(),
            mistake_level: row.mistake_level.clone(),
            feedback_type: row.feedback_type.clone(),
        }
    }
}

/// Session state as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub teacher_name: String,
    pub dataset_name: String,
    pub status: ProgressState,
    pub progress: ProgressSummary,
    /// `None` once the dataset is complete
    pub current: Option<ProblemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
