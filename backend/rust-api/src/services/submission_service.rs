use chrono::{DateTime, Utc};
use std::sync::Arc;
use validator::Validate;

use super::annotation_store::{AnnotationStore, InsertOutcome};
use super::errors::{SessionError, StoreError};
use crate::metrics::ANNOTATIONS_SUBMITTED_TOTAL;
use crate::models::{AnnotationRecord, ProblemRow, RubricScores, SubmissionOutcome};
use crate::utils::retry::{retry_async_if, RetryConfig};
use crate::utils::time::iso_timestamp;

/// Writes rubric ratings to the shared annotation store
pub struct SubmissionService {
    store: Arc<dyn AnnotationStore>,
    retry: RetryConfig,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn AnnotationStore>) -> Self {
        Self {
            store,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Denormalized record for one row, stamped with `now`
    pub fn build_record(
        teacher_name: &str,
        dataset_name: &str,
        row: &ProblemRow,
        scores: &RubricScores,
        teacher_comments: Option<String>,
        now: DateTime<Utc>,
    ) -> AnnotationRecord {
        AnnotationRecord {
            teacher_name: teacher_name.to_string(),
            dataset_name: dataset_name.to_string(),
            row_index: row.row_id,
            problem: row.problem.clone(),
            student_answer: row.student_answer.clone(),
            correct_answer: row.correct_answer.clone(),
            generated_feedback: row.generated_feedback.clone(),
            relevancy: scores.relevancy,
            accuracy: scores.accuracy,
            motivation: scores.motivation,
            demotivation: scores.demotivation,
            guidance: scores.guidance,
            tone_style: scores.tone_style,
            teacher_comments,
            timestamp: iso_timestamp(now),
        }
    }

    /// Inserts one annotation.
    ///
    /// An existing record for the same (teacher, dataset, row) is reported as
    /// `AlreadyAnnotated` rather than an error. Transient failures are retried;
    /// a retried insert that already landed comes back as a duplicate.
    pub async fn submit(
        &self,
        teacher_name: &str,
        dataset_name: &str,
        row: &ProblemRow,
        scores: &RubricScores,
        teacher_comments: Option<String>,
    ) -> Result<SubmissionOutcome, SessionError> {
        scores.validate()?;

        let record = Self::build_record(
            teacher_name,
            dataset_name,
            row,
            scores,
            teacher_comments,
            Utc::now(),
        );

        let inserted = retry_async_if(
            self.retry.clone(),
            || self.store.insert_annotation(&record),
            StoreError::is_transient,
        )
        .await;

        let outcome = match inserted {
            Ok(InsertOutcome::Inserted) => SubmissionOutcome::Saved,
            Ok(InsertOutcome::Duplicate) => {
                tracing::info!(
                    teacher = teacher_name,
                    dataset = dataset_name,
                    row_id = row.row_id,
                    "Row already annotated, treating as done"
                );
                SubmissionOutcome::AlreadyAnnotated
            }
            Err(e) => {
                tracing::error!(
                    teacher = teacher_name,
                    dataset = dataset_name,
                    row_id = row.row_id,
                    "Failed to save annotation: {}",
                    e
                );
                ANNOTATIONS_SUBMITTED_TOTAL
                    .with_label_values(&[dataset_name, "error"])
                    .inc();
                return Err(SessionError::Save(e));
            }
        };

        ANNOTATIONS_SUBMITTED_TOTAL
            .with_label_values(&[dataset_name, outcome.as_str()])
            .inc();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::annotation_store::MemoryAnnotationStore;
    use chrono::TimeZone;

    fn row() -> ProblemRow {
        ProblemRow {
            row_id: 7,
            position: 6,
            problem: "12 x 3".to_string(),
            correct_answer: "36".to_string(),
            student_answer: "35".to_string(),
            generated_feedback: "{\"Feedback\": \"Recount the tens\"}".to_string(),
            feedback_text: "Recount the tens".to_string(),
            knowledge_level: None,
            mistake_level: None,
            feedback_type: None,
        }
    }

    fn scores() -> RubricScores {
        RubricScores {
            relevancy: 3,
            accuracy: 1,
            motivation: 2,
            demotivation: 1,
            guidance: 3,
            tone_style: 4,
        }
    }

    #[test]
    fn record_copies_row_content() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let record = SubmissionService::build_record(
            "Bu Sari",
            "RAG4O",
            &row(),
            &scores(),
            Some("ok".to_string()),
            now,
        );

        assert_eq!(record.row_index, 7);
        assert_eq!(record.student_answer, "35");
        assert_eq!(record.generated_feedback, "{\"Feedback\": \"Recount the tens\"}");
        assert_eq!(record.tone_style, 4);
        assert_eq!(record.timestamp, "2025-03-04T05:06:07.000000Z");
    }

    #[tokio::test]
    async fn second_submit_is_already_annotated() {
        let store = Arc::new(MemoryAnnotationStore::new());
        let service = SubmissionService::new(store.clone());

        let first = service
            .submit("A", "RAG4O", &row(), &scores(), None)
            .await
            .unwrap();
        let second = service
            .submit("A", "RAG4O", &row(), &scores(), None)
            .await
            .unwrap();

        assert_eq!(first, SubmissionOutcome::Saved);
        assert_eq!(second, SubmissionOutcome::AlreadyAnnotated);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn invalid_scores_never_reach_the_store() {
        let store = Arc::new(MemoryAnnotationStore::new());
        let service = SubmissionService::new(store.clone());
        let mut bad = scores();
        bad.demotivation = 4;

        let err = service
            .submit("A", "RAG4O", &row(), &bad, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_a_save_error() {
        let store = Arc::new(MemoryAnnotationStore::new());
        store.fail_inserts(true);
        let service = SubmissionService::new(store).with_retry(RetryConfig::no_retry());

        let err = service
            .submit("A", "RAG4O", &row(), &scores(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Save(_)));
    }
}
