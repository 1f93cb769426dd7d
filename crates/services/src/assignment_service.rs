use std::sync::Arc;

use classroom_core::Clock;
use classroom_core::countdown::{CountdownState, deadline_label};
use classroom_core::model::{Assignment, AssignmentId, CourseId, GradingInfo, StudentId};
use reqwest::StatusCode;

use crate::api::ClassroomApi;
use crate::countdown::CountdownTimer;
use crate::error::ApiError;
use crate::messages::MessageKey;
use crate::notify::{Notification, Notifier, report_failure};

/// An assignment the student already has feedback for.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAssignment {
    pub assignment: Assignment,
    pub info: GradingInfo,
}

impl GradedAssignment {
    /// Sum of the question grades, ungraded questions counting as zero.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.info
            .grading_feedback
            .iter()
            .map(|f| f.grade_or_zero())
            .sum()
    }
}

/// Assignment listings and their deadlines.
#[derive(Clone)]
pub struct AssignmentService {
    clock: Clock,
    api: Arc<dyn ClassroomApi>,
    notifier: Arc<dyn Notifier>,
}

impl AssignmentService {
    #[must_use]
    pub fn new(clock: Clock, api: Arc<dyn ClassroomApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            api,
            notifier,
        }
    }

    /// Assignments of a course as seen by one student.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the listing cannot be fetched; the failure is
    /// also notified.
    pub async fn list(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Vec<Assignment>, ApiError> {
        report_failure(
            self.notifier.as_ref(),
            MessageKey::AssignmentsLoadFailed,
            self.api.student_assignments(student_id, course_id).await,
        )
    }

    /// The student's assignments that already carry feedback, in listing
    /// order. Assignments whose feedback cannot be fetched are left out.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the assignment listing cannot be fetched.
    pub async fn graded(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Vec<GradedAssignment>, ApiError> {
        let assignments = self.list(student_id, course_id).await?;
        let mut graded = Vec::new();
        for assignment in assignments {
            match self.api.grading_info(student_id, assignment.id).await {
                Ok(info) if !info.grading_feedback.is_empty() => {
                    graded.push(GradedAssignment { assignment, info });
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(assignment_id = %assignment.id, error = %err, "no feedback");
                }
            }
        }
        Ok(graded)
    }

    /// Find one assignment of the student's course listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 when the assignment is not listed,
    /// or the listing error.
    pub async fn find(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, ApiError> {
        let found = self
            .list(student_id, course_id)
            .await?
            .into_iter()
            .find(|a| a.id == assignment_id);
        found.ok_or_else(|| {
            self.notifier
                .notify(Notification::error(MessageKey::AssignmentNotFound));
            ApiError::Status {
                status: StatusCode::NOT_FOUND,
                detail: format!("Assignment {assignment_id} not found"),
            }
        })
    }

    /// Countdown state of `assignment` at the service clock's current time.
    #[must_use]
    pub fn countdown_state(&self, assignment: &Assignment) -> CountdownState {
        CountdownState::at(assignment.due_date, self.clock.now())
    }

    /// Starts a ticking countdown for `assignment`. Requires a tokio runtime.
    #[must_use]
    pub fn countdown(&self, assignment: &Assignment) -> CountdownTimer {
        CountdownTimer::start(self.clock, assignment.id, assignment.due_date)
    }

    #[must_use]
    pub fn deadline_label(&self, assignment: &Assignment) -> String {
        deadline_label(assignment.due_date)
    }

    #[must_use]
    pub fn is_past_due(&self, assignment: &Assignment) -> bool {
        assignment.is_past_due(self.clock.now())
    }
}
