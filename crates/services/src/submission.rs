//! Sends a teacher's grade edits and then validates the assignment.

use std::sync::Arc;

use classroom_core::grading::GradeForm;
use classroom_core::model::{AssignmentId, CourseId, StudentId};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::ClassroomApi;
use crate::busy::BusyFlag;
use crate::error::SubmissionError;
use crate::messages::MessageKey;
use crate::notify::{Notification, Notifier};

/// Screen the client should show next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    GradeList { course_id: CourseId },
}

impl Route {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::GradeList { course_id } => format!("/teacher/course/{course_id}/notes"),
        }
    }
}

/// Which student's grades are being submitted, and from which course view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTarget {
    pub course_id: CourseId,
    pub student_id: StudentId,
    pub assignment_id: AssignmentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Number of grade updates sent before validating.
    pub updated: usize,
    pub navigate_to: Route,
}

#[derive(Clone)]
pub struct SubmissionOrchestrator {
    api: Arc<dyn ClassroomApi>,
    notifier: Arc<dyn Notifier>,
    busy: BusyFlag,
}

impl SubmissionOrchestrator {
    #[must_use]
    pub fn new(api: Arc<dyn ClassroomApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            busy: BusyFlag::default(),
        }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.busy.is_busy()
    }

    /// Sends every pending edit of `form` in order, then validates the grades.
    ///
    /// Updates are single-attempt and stop at the first failure; updates that
    /// already succeeded are not rolled back. On success the form is locked.
    ///
    /// # Errors
    ///
    /// - `SubmissionError::AlreadyValidated` if the form is locked (no request is sent).
    /// - `SubmissionError::InFlight` if another submission is running.
    /// - `SubmissionError::GradeUpdate` when an update fails; validation is skipped.
    /// - `SubmissionError::Validation` when the validate call fails.
    pub async fn submit(
        &self,
        target: SubmissionTarget,
        form: &mut GradeForm,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        if form.is_locked() {
            self.notifier
                .notify(Notification::error(MessageKey::GradesAlreadyValidated));
            return Err(SubmissionError::AlreadyValidated);
        }
        let Some(_guard) = self.busy.try_acquire() else {
            tracing::debug!("grade submission already running");
            return Err(SubmissionError::InFlight);
        };

        let span = tracing::info_span!(
            "submit_grades",
            run = %Uuid::new_v4(),
            student = %target.student_id,
            assignment = %target.assignment_id,
        );
        self.run(target, form).instrument(span).await
    }

    async fn run(
        &self,
        target: SubmissionTarget,
        form: &mut GradeForm,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let edits = form.edits();
        tracing::info!(edits = edits.len(), "submitting grades");

        for (applied, &(question_id, grade)) in edits.iter().enumerate() {
            if let Err(source) = self
                .api
                .update_grade(target.assignment_id, target.student_id, question_id, grade)
                .await
            {
                tracing::warn!(%question_id, applied, error = %source, "grade update failed");
                self.notifier
                    .notify(Notification::error(MessageKey::GradesUpdateFailed));
                return Err(SubmissionError::GradeUpdate {
                    question_id,
                    applied,
                    source,
                });
            }
        }

        if let Err(source) = self
            .api
            .validate_assignment(target.student_id, target.assignment_id)
            .await
        {
            tracing::warn!(error = %source, "validation failed");
            self.notifier
                .notify(Notification::error(MessageKey::ExamValidationFailed));
            return Err(SubmissionError::Validation(source));
        }

        form.mark_validated()?;
        let message = if edits.is_empty() {
            MessageKey::ExamValidated
        } else {
            MessageKey::GradesUpdatedAndValidated
        };
        self.notifier.notify(Notification::success(message));
        tracing::info!(updated = edits.len(), "grades validated");

        Ok(SubmissionOutcome {
            updated: edits.len(),
            navigate_to: Route::GradeList {
                course_id: target.course_id,
            },
        })
    }
}
