use axum::http::StatusCode;
use std::time::Duration;

use crate::models::RowId;

/// Failure talking to an annotation or session backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Whether repeating the operation may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Serialization(_))
    }
}

/// Errors surfaced by the annotation session workflow
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Please enter your name")]
    BlankTeacherName,
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
    #[error("Row {row_id} does not exist in dataset {dataset}")]
    RowNotFound { dataset: String, row_id: RowId },
    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Error saving to database: {0}")]
    Save(#[source] StoreError),
    #[error("Session storage error: {0}")]
    SessionStorage(#[source] StoreError),
}

impl SessionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SessionError::NotFound | SessionError::RowNotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::BlankTeacherName
            | SessionError::UnknownDataset(_)
            | SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::Save(_) | SessionError::SessionStorage(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}
