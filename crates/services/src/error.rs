//! Shared error types for the services crate.

use thiserror::Error;

use classroom_core::grading::GradeError;
use classroom_core::model::{AssignmentId, DraftError, QuestionId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the classroom REST client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("{detail} (status {status})")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors emitted by `SubmissionOrchestrator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("grades are already validated")]
    AlreadyValidated,
    #[error("a submission is already in progress")]
    InFlight,
    #[error("updating the grade of question {question_id} failed after {applied} applied update(s)")]
    GradeUpdate {
        question_id: QuestionId,
        applied: usize,
        #[source]
        source: ApiError,
    },
    #[error("validating grades failed")]
    Validation(#[source] ApiError),
    #[error(transparent)]
    Grade(#[from] GradeError),
}

/// Errors emitted by `GradingService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradingViewError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `GradeTableService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradeTableError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors emitted while writing the grade table export.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error("there is nothing to export")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("writing the workbook failed: {0}")]
    Xlsx(String),
}

/// Errors emitted by `ComposeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComposeError {
    #[error("questions are already being published")]
    InFlight,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `ResponseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResponseError {
    #[error("responses are already being sent")]
    InFlight,
    #[error("the deadline of assignment {0} has passed")]
    DeadlinePassed(AssignmentId),
    #[error("assignment {0} has no questions to answer")]
    NoQuestions(AssignmentId),
    #[error("question {0} has no answer")]
    MissingAnswer(QuestionId),
    #[error("only students can submit responses")]
    NotAStudent,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
