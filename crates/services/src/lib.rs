#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod assignment_service;
mod busy;
pub mod compose_service;
pub mod config;
pub mod countdown;
pub mod error;
pub mod grade_table_service;
pub mod grading_service;
pub mod messages;
pub mod notify;
pub mod response_service;
pub mod session;
pub mod submission;

pub use classroom_core::Clock;

pub use api::{ClassroomApi, HttpClassroomApi, InMemoryApi};
pub use app_services::AppServices;
pub use assignment_service::{AssignmentService, GradedAssignment};
pub use compose_service::ComposeService;
pub use config::{ApiConfig, AppConfig};
pub use countdown::CountdownTimer;
pub use error::{
    ApiError, AppServicesError, ComposeError, ConfigError, ExportError, GradeTableError,
    GradingViewError, ResponseError, SubmissionError,
};
pub use grade_table_service::GradeTableService;
pub use grading_service::{GradingService, GradingView};
pub use messages::MessageKey;
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier};
pub use response_service::{AnswerDraft, ResponseService};
pub use session::{Role, Session};
pub use submission::{Route, SubmissionOrchestrator, SubmissionOutcome};
