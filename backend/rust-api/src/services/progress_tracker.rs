use std::collections::BTreeSet;
use std::sync::Arc;

use super::annotation_store::AnnotationStore;
use super::dataset_catalog::Dataset;
use super::errors::StoreError;
use crate::metrics::PROGRESS_FETCH_DEGRADED_TOTAL;
use crate::models::Progress;
use crate::utils::retry::{retry_async_if, RetryConfig};

/// Progress computed at login or dataset switch
#[derive(Debug, Clone)]
pub struct InitializedProgress {
    pub progress: Progress,
    /// Present when prior annotations could not be fetched
    pub warning: Option<String>,
}

/// Builds a teacher's remaining work set from the annotation store
pub struct ProgressTracker {
    store: Arc<dyn AnnotationStore>,
    retry: RetryConfig,
}

impl ProgressTracker {
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

    /// Splits the dataset's rows into remaining and annotated for `teacher_name`.
    ///
    /// A failing store query does not block annotation work: after the
    /// retries are exhausted the teacher starts from an empty annotated set
    /// and the result carries a warning. Rows re-presented this way are
    /// absorbed by the duplicate-tolerant insert.
    pub async fn initialize(&self, teacher_name: &str, dataset: &Dataset) -> InitializedProgress {
        let fetched = retry_async_if(
            self.retry.clone(),
            || async {
                self.store
                    .query_annotated_rows(teacher_name, dataset.name())
                    .await
            },
            StoreError::is_transient,
        )
        .await;

        match fetched {
            Ok(stored) => {
                let progress = Progress::compute(dataset.row_ids(), &stored);
                tracing::info!(
                    teacher = teacher_name,
                    dataset = dataset.name(),
                    annotated = progress.annotated().len(),
                    remaining = progress.remaining().len(),
                    "Progress initialized"
                );
                InitializedProgress {
                    progress,
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    teacher = teacher_name,
                    dataset = dataset.name(),
                    "Could not fetch previous annotations, assuming none: {}",
                    e
                );
                PROGRESS_FETCH_DEGRADED_TOTAL.inc();
                InitializedProgress {
                    progress: Progress::compute(dataset.row_ids(), &BTreeSet::new()),
                    warning: Some(format!("Could not fetch previous annotations: {}", e)),
                }
            }
        }
    }
}
