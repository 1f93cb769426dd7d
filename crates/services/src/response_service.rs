use std::sync::Arc;

use classroom_core::Clock;
use classroom_core::model::{Assignment, AssignmentId, Question, QuestionId, StudentId};

use crate::api::{ClassroomApi, ResponseSubmission, StudentResponse};
use crate::busy::BusyFlag;
use crate::error::{ApiError, ResponseError};
use crate::messages::MessageKey;
use crate::notify::{Notification, Notifier, report_failure};
use crate::session::Session;

/// A student's answer to one question, before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDraft {
    pub question_id: QuestionId,
    pub text: String,
}

impl AnswerDraft {
    #[must_use]
    pub fn new(question_id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            question_id,
            text: text.into(),
        }
    }
}

/// Student-side answering of an assignment.
#[derive(Clone)]
pub struct ResponseService {
    clock: Clock,
    api: Arc<dyn ClassroomApi>,
    notifier: Arc<dyn Notifier>,
    student_id: Option<StudentId>,
    busy: BusyFlag,
}

impl ResponseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn ClassroomApi>,
        notifier: Arc<dyn Notifier>,
        session: &Session,
    ) -> Self {
        Self {
            clock,
            api,
            notifier,
            student_id: session.student_id(),
            busy: BusyFlag::default(),
        }
    }

    /// Questions to answer for an assignment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the questions cannot be fetched; the failure is
    /// also notified.
    pub async fn questions(&self, assignment_id: AssignmentId) -> Result<Vec<Question>, ApiError> {
        report_failure(
            self.notifier.as_ref(),
            MessageKey::QuestionsLoadFailed,
            self.api.questions(assignment_id).await,
        )
    }

    /// Submit one answer per question.
    ///
    /// The deadline is checked against the clock first; a late submission
    /// never reaches the backend.
    ///
    /// # Errors
    ///
    /// - `ResponseError::NotAStudent` for a teacher session.
    /// - `ResponseError::DeadlinePassed` once the due date is behind the clock.
    /// - `ResponseError::NoQuestions` / `ResponseError::MissingAnswer` for an
    ///   empty submission or a blank answer.
    /// - `ResponseError::InFlight` while another submission runs.
    /// - `ResponseError::Api` when the backend rejects the responses.
    pub async fn submit(
        &self,
        assignment: &Assignment,
        answers: &[AnswerDraft],
    ) -> Result<usize, ResponseError> {
        let student_id = self.student_id.ok_or(ResponseError::NotAStudent)?;

        if assignment.is_past_due(self.clock.now()) {
            self.notifier
                .notify(Notification::error(MessageKey::DeadlinePassed));
            return Err(ResponseError::DeadlinePassed(assignment.id));
        }
        if answers.is_empty() {
            self.notifier
                .notify(Notification::error(MessageKey::QuestionsNotAvailable));
            return Err(ResponseError::NoQuestions(assignment.id));
        }
        if let Some(blank) = answers.iter().find(|a| a.text.trim().is_empty()) {
            self.notifier
                .notify(Notification::error(MessageKey::AnswerAllQuestions));
            return Err(ResponseError::MissingAnswer(blank.question_id));
        }

        let Some(_guard) = self.busy.try_acquire() else {
            return Err(ResponseError::InFlight);
        };

        let submission = ResponseSubmission {
            assignment_id: assignment.id,
            student_id,
            responses: answers
                .iter()
                .map(|a| StudentResponse {
                    question_id: a.question_id,
                    response_text: a.text.clone(),
                    file: None,
                })
                .collect(),
        };

        match self.api.submit_responses(&submission).await {
            Ok(()) => {
                tracing::info!(assignment_id = %assignment.id, responses = answers.len(), "responses sent");
                self.notifier
                    .notify(Notification::success(MessageKey::ResponsesSent));
                Ok(answers.len())
            }
            Err(err) => {
                tracing::warn!(assignment_id = %assignment.id, error = %err, "sending responses failed");
                self.notifier
                    .notify(Notification::error(MessageKey::ResponsesFailed));
                Err(err.into())
            }
        }
    }
}
