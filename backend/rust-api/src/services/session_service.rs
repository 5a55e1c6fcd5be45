use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::annotation_store::AnnotationStore;
use super::dataset_catalog::{Dataset, DatasetCatalog};
use super::errors::SessionError;
use super::progress_tracker::ProgressTracker;
use super::session_store::SessionStore;
use super::submission_service::SubmissionService;
use super::AppState;
use crate::metrics::SESSIONS_TOTAL;
use crate::models::{
    AnnotationSession, LoginRequest, ProblemView, ProgressState, SessionView,
    SubmitAnnotationRequest, SubmitAnnotationResponse, SwitchDatasetRequest,
};
use crate::utils::retry::RetryConfig;

/// Login, navigation and submission for one teacher working through a dataset
pub struct AnnotationSessionService {
    catalog: Arc<DatasetCatalog>,
    sessions: Arc<dyn SessionStore>,
    tracker: ProgressTracker,
    submissions: SubmissionService,
}

impl AnnotationSessionService {
    pub fn new(
        catalog: Arc<DatasetCatalog>,
        annotations: Arc<dyn AnnotationStore>,
        sessions: Arc<dyn SessionStore>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            catalog,
            sessions,
            tracker: ProgressTracker::new(annotations.clone()).with_retry(retry.clone()),
            submissions: SubmissionService::new(annotations).with_retry(retry),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.catalog.clone(),
            state.annotations.clone(),
            state.sessions.clone(),
            state.retry.clone(),
        )
    }

    pub async fn login(&self, req: LoginRequest) -> Result<SessionView, SessionError> {
        let req = LoginRequest {
            teacher_name: req.teacher_name.trim().to_string(),
            dataset_name: req.dataset_name,
        };
        if req.teacher_name.is_empty() {
            return Err(SessionError::BlankTeacherName);
        }
        req.validate()?;

        let LoginRequest {
            teacher_name,
            dataset_name,
        } = req;
        let dataset = self.dataset(&dataset_name)?;
        let init = self.tracker.initialize(&teacher_name, &dataset).await;

        let now = Utc::now();
        let session = AnnotationSession {
            id: Uuid::new_v4().to_string(),
            teacher_name,
            dataset_name: dataset.name().to_string(),
            progress: init.progress,
            warning: init.warning,
            created_at: now,
            updated_at: now,
        };
        self.save(&session).await?;

        SESSIONS_TOTAL.with_label_values(&["created"]).inc();

        tracing::info!(
            "Session created: {} for teacher: {} on dataset: {}",
            session.id,
            session.teacher_name,
            session.dataset_name
        );

        Ok(session_view(&session, &dataset))
    }

    pub async fn view(&self, session_id: &str) -> Result<SessionView, SessionError> {
        let session = self.load(session_id).await?;
        let dataset = self.dataset(&session.dataset_name)?;
        Ok(session_view(&session, &dataset))
    }

    /// Recomputes progress for another dataset under the same teacher
    pub async fn switch_dataset(
        &self,
        session_id: &str,
        req: SwitchDatasetRequest,
    ) -> Result<SessionView, SessionError> {
        req.validate()?;
        let mut session = self.load(session_id).await?;
        let dataset = self.dataset(&req.dataset_name)?;

        let init = self.tracker.initialize(&session.teacher_name, &dataset).await;
        session.dataset_name = dataset.name().to_string();
        session.progress = init.progress;
        session.warning = init.warning;
        session.updated_at = Utc::now();
        self.save(&session).await?;

        SESSIONS_TOTAL.with_label_values(&["switched"]).inc();
        tracing::info!(
            "Session {} switched to dataset: {}",
            session.id,
            session.dataset_name
        );

        Ok(session_view(&session, &dataset))
    }

    /// Stores one rubric rating and advances to the next remaining row.
    ///
    /// Progress only moves when the store accepted the record or already
    /// held one for the row.
    pub async fn submit(
        &self,
        session_id: &str,
        req: SubmitAnnotationRequest,
    ) -> Result<SubmitAnnotationResponse, SessionError> {
        req.validate()?;
        let mut session = self.load(session_id).await?;
        let dataset = self.dataset(&session.dataset_name)?;

        let row = dataset
            .row(req.row_id)
            .ok_or_else(|| SessionError::RowNotFound {
                dataset: dataset.name().to_string(),
                row_id: req.row_id,
            })?;

        let outcome = self
            .submissions
            .submit(
                &session.teacher_name,
                dataset.name(),
                row,
                &req.scores,
                req.normalized_comments(),
            )
            .await?;

        session.progress.record_submission(row.row_id);
        session.updated_at = Utc::now();
        self.save(&session).await?;

        if session.progress.state() == ProgressState::Complete {
            tracing::info!(
                "Teacher {} completed dataset {}",
                session.teacher_name,
                session.dataset_name
            );
        }

        Ok(SubmitAnnotationResponse {
            outcome,
            message: outcome.message().to_string(),
            session: session_view(&session, &dataset),
        })
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), SessionError> {
        let removed = self
            .sessions
            .remove(session_id)
            .await
            .map_err(SessionError::SessionStorage)?;
        if !removed {
            return Err(SessionError::NotFound);
        }

        SESSIONS_TOTAL.with_label_values(&["closed"]).inc();
        tracing::info!("Session closed: {}", session_id);
        Ok(())
    }

    fn dataset(&self, name: &str) -> Result<Arc<Dataset>, SessionError> {
        self.catalog
            .get(name)
            .map_err(|_| SessionError::UnknownDataset(name.to_string()))
    }

    async fn load(&self, session_id: &str) -> Result<AnnotationSession, SessionError> {
        self.sessions
            .load(session_id)
            .await
            .map_err(SessionError::SessionStorage)?
            .ok_or(SessionError::NotFound)
    }

    async fn save(&self, session: &AnnotationSession) -> Result<(), SessionError> {
        self.sessions
            .save(session)
            .await
            .map_err(SessionError::SessionStorage)
    }
}

fn session_view(session: &AnnotationSession, dataset: &Dataset) -> SessionView {
    SessionView {
        session_id: session.id.clone(),
        teacher_name: session.teacher_name.clone(),
        dataset_name: session.dataset_name.clone(),
        status: session.progress.state(),
        progress: session.progress.summary(),
        current: session
            .progress
            .next_row()
            .and_then(|row_id| dataset.row(row_id))
            .map(ProblemView::from),
        warning: session.warning.clone(),
    }
}
