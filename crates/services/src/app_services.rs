use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::api::{ClassroomApi, HttpClassroomApi};
use crate::assignment_service::AssignmentService;
use crate::compose_service::ComposeService;
use crate::config::AppConfig;
use crate::error::AppServicesError;
use crate::grade_table_service::GradeTableService;
use crate::grading_service::GradingService;
use crate::notify::{LogNotifier, Notifier};
use crate::response_service::ResponseService;
use crate::session::Session;
use crate::submission::SubmissionOrchestrator;

/// Assembles app-facing services around one authenticated session.
#[derive(Clone)]
pub struct AppServices {
    session: Session,
    clock: Clock,
    notifier: Arc<dyn Notifier>,
    grading: Arc<GradingService>,
    grade_table: Arc<GradeTableService>,
    submission: Arc<SubmissionOrchestrator>,
    assignments: Arc<AssignmentService>,
    compose: Arc<ComposeService>,
    responses: Arc<ResponseService>,
}

impl AppServices {
    /// Build services talking to the configured backend, with drafts in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client or the draft store cannot
    /// be initialised.
    pub async fn connect(config: AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let api: Arc<dyn ClassroomApi> =
            Arc::new(HttpClassroomApi::new(&config.api, config.session.clone())?);
        let storage = Storage::sqlite(&config.drafts_db).await?;
        tracing::info!(
            api = %config.api.base_url,
            role = %config.session.role(),
            "services ready"
        );
        Ok(Self::with_parts(
            config.session,
            clock,
            api,
            storage,
            Arc::new(LogNotifier),
        ))
    }

    /// Wire services from already-built parts.
    #[must_use]
    pub fn with_parts(
        session: Session,
        clock: Clock,
        api: Arc<dyn ClassroomApi>,
        storage: Storage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let grading = Arc::new(GradingService::new(
            Arc::clone(&api),
            Arc::clone(&notifier),
        ));
        let grade_table = Arc::new(GradeTableService::new(
            Arc::clone(&api),
            Arc::clone(&notifier),
        ));
        let submission = Arc::new(SubmissionOrchestrator::new(
            Arc::clone(&api),
            Arc::clone(&notifier),
        ));
        let assignments = Arc::new(AssignmentService::new(
            clock,
            Arc::clone(&api),
            Arc::clone(&notifier),
        ));
        let compose = Arc::new(ComposeService::new(
            Arc::clone(&api),
            Arc::clone(&storage.drafts),
            Arc::clone(&notifier),
        ));
        let responses = Arc::new(ResponseService::new(
            clock,
            Arc::clone(&api),
            Arc::clone(&notifier),
            &session,
        ));

        Self {
            session,
            clock,
            notifier,
            grading,
            grade_table,
            submission,
            assignments,
            compose,
            responses,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    #[must_use]
    pub fn grading(&self) -> Arc<GradingService> {
        Arc::clone(&self.grading)
    }

    #[must_use]
    pub fn grade_table(&self) -> Arc<GradeTableService> {
        Arc::clone(&self.grade_table)
    }

    #[must_use]
    pub fn submission(&self) -> Arc<SubmissionOrchestrator> {
        Arc::clone(&self.submission)
    }

    #[must_use]
    pub fn assignments(&self) -> Arc<AssignmentService> {
        Arc::clone(&self.assignments)
    }

    #[must_use]
    pub fn compose(&self) -> Arc<ComposeService> {
        Arc::clone(&self.compose)
    }

    #[must_use]
    pub fn responses(&self) -> Arc<ResponseService> {
        Arc::clone(&self.responses)
    }

    /// Ends the session. The services and the token are dropped with `self`.
    pub fn logout(self) {
        tracing::info!(user = %self.session.user_id(), "logged out");
    }
}
