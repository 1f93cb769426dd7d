use std::sync::Arc;

use classroom_core::grading::{
    GradeForm, GradeState, grading_map, has_modified, has_validated_grades, total_grade,
    total_points,
};
use classroom_core::model::{AssignmentId, GradingFeedback, GradingInfo, Question, StudentId};

use crate::api::ClassroomApi;
use crate::error::GradingViewError;
use crate::messages::MessageKey;
use crate::notify::{Notifier, report_failure};

/// Everything the grading screen of one (student, assignment) shows.
#[derive(Debug, Clone)]
pub struct GradingView {
    questions: Vec<Question>,
    info: GradingInfo,
    form: GradeForm,
}

/// A question next to its stored feedback, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingRow<'a> {
    pub question: &'a Question,
    pub feedback: Option<&'a GradingFeedback>,
    /// Current form value for the question.
    pub grade: f64,
}

impl GradingView {
    #[must_use]
    pub fn new(questions: Vec<Question>, info: GradingInfo) -> Self {
        let form = GradeForm::new(&questions, Some(&info));
        Self {
            questions,
            info,
            form,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn info(&self) -> &GradingInfo {
        &self.info
    }

    #[must_use]
    pub fn form(&self) -> &GradeForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut GradeForm {
        &mut self.form
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        total_points(Some(self.questions.as_slice()))
    }

    /// Total of the stored grades, as reported by the backend.
    #[must_use]
    pub fn stored_total(&self) -> f64 {
        total_grade(Some(self.info.grading_feedback.as_slice()))
    }

    /// Grades are shown read-only once an edit is pending on the backend.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        has_modified(Some(self.info.grading_feedback.as_slice())) || self.form.is_locked()
    }

    #[must_use]
    pub fn can_validate(&self) -> bool {
        !has_validated_grades(Some(&self.info)) && !self.form.is_locked()
    }

    /// Label of the validate action.
    #[must_use]
    pub fn validate_label(&self) -> MessageKey {
        if self.can_validate() {
            MessageKey::ValidateGrades
        } else {
            MessageKey::GradesAlreadyValidated
        }
    }

    #[must_use]
    pub fn state(&self) -> GradeState {
        self.form.state()
    }

    #[must_use]
    pub fn rows(&self) -> Vec<GradingRow<'_>> {
        let feedback = grading_map(&self.info.grading_feedback);
        self.questions
            .iter()
            .map(|question| {
                let key = question.feedback_key();
                GradingRow {
                    question,
                    feedback: feedback.get(&key).copied(),
                    grade: self.form.value(key).unwrap_or(0.0),
                }
            })
            .collect()
    }

    #[must_use]
    pub fn advice(&self) -> Option<&str> {
        self.info.advice.as_deref()
    }
}

/// Loads grading views from the backend.
#[derive(Clone)]
pub struct GradingService {
    api: Arc<dyn ClassroomApi>,
    notifier: Arc<dyn Notifier>,
}

impl GradingService {
    #[must_use]
    pub fn new(api: Arc<dyn ClassroomApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Fetch the questions and grading info of a student's assignment.
    ///
    /// # Errors
    ///
    /// Returns `GradingViewError::Api` if either request fails; the failure is
    /// also notified.
    pub async fn load(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<GradingView, GradingViewError> {
        let loaded = tokio::try_join!(
            self.api.questions(assignment_id),
            self.api.grading_info(student_id, assignment_id),
        );
        let (questions, info) =
            report_failure(self.notifier.as_ref(), MessageKey::GradingLoadFailed, loaded)?;
        tracing::debug!(
            %student_id,
            %assignment_id,
            questions = questions.len(),
            validated = info.is_validated(),
            "grading view loaded"
        );
        Ok(GradingView::new(questions, info))
    }
}
