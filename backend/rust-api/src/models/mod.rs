pub mod annotation;
pub mod dataset;
pub mod progress;
pub mod rubric;
pub mod session;

pub use annotation::{
    AnnotationRecord, RubricScores, SubmissionOutcome, SubmitAnnotationRequest,
    SubmitAnnotationResponse,
};
pub use dataset::{DatasetProfile, DatasetSummary, ProblemRow, RowId};
pub use progress::{Progress, ProgressState, ProgressSummary};
pub use session::{
    AnnotationSession, LoginRequest, ProblemView, SessionView, SwitchDatasetRequest,
};
