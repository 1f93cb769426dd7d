use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use classroom_core::model::{
    Assignment, AssignmentId, CourseGradeColumn, CourseId, GradingFeedback, GradingInfo, Question,
    QuestionId, StudentId,
};
use reqwest::StatusCode;

use super::{ClassroomApi, NewQuestions, ResponseSubmission};
use crate::error::ApiError;

/// A request seen by [`InMemoryApi`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GradingInfo(StudentId, AssignmentId),
    CourseGradeColumns(CourseId),
    UpdateGrade {
        assignment_id: AssignmentId,
        student_id: StudentId,
        question_id: QuestionId,
        grade: f64,
    },
    Validate(StudentId, AssignmentId),
    Questions(AssignmentId),
    StudentAssignments(StudentId, CourseId),
    CreateQuestions(NewQuestions),
    SubmitResponses(ResponseSubmission),
}

#[derive(Default)]
struct Inner {
    grading: HashMap<(StudentId, AssignmentId), GradingInfo>,
    columns: HashMap<CourseId, Vec<CourseGradeColumn>>,
    questions: HashMap<AssignmentId, Vec<Question>>,
    assignments: HashMap<(StudentId, CourseId), Vec<Assignment>>,
    failing_updates: HashSet<QuestionId>,
    fail_validation: bool,
    fail_create_questions: bool,
    fail_submit_responses: bool,
    fail_reads: bool,
    latency: Option<Duration>,
    calls: Vec<ApiCall>,
}

/// Simple in-memory backend for testing and offline prototyping.
///
/// Grade updates and validations are applied to the stored grading info so
/// later reads observe them.
#[derive(Clone, Default)]
pub struct InMemoryApi {
    inner: Arc<Mutex<Inner>>,
}

fn server_error(detail: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        detail: detail.to_string(),
    }
}

fn not_found(detail: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        detail: detail.to_string(),
    }
}

impl InMemoryApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Result<R, ApiError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| server_error(&e.to_string()))?;
        Ok(f(&mut guard))
    }

    fn configure(&self, f: impl FnOnce(&mut Inner)) {
        if let Ok(mut guard) = self.inner.lock() {
            f(&mut guard);
        }
    }

    pub fn put_grading_info(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
        info: GradingInfo,
    ) {
        self.configure(|inner| {
            inner.grading.insert((student_id, assignment_id), info);
        });
    }

    pub fn put_course_columns(&self, course_id: CourseId, columns: Vec<CourseGradeColumn>) {
        self.configure(|inner| {
            inner.columns.insert(course_id, columns);
        });
    }

    pub fn put_questions(&self, assignment_id: AssignmentId, questions: Vec<Question>) {
        self.configure(|inner| {
            inner.questions.insert(assignment_id, questions);
        });
    }

    pub fn put_student_assignments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        assignments: Vec<Assignment>,
    ) {
        self.configure(|inner| {
            inner.assignments.insert((student_id, course_id), assignments);
        });
    }

    /// Makes every update of `question_id` fail with a server error.
    pub fn fail_update_of(&self, question_id: QuestionId) {
        self.configure(|inner| {
            inner.failing_updates.insert(question_id);
        });
    }

    pub fn fail_validation(&self, fail: bool) {
        self.configure(|inner| inner.fail_validation = fail);
    }

    pub fn fail_create_questions(&self, fail: bool) {
        self.configure(|inner| inner.fail_create_questions = fail);
    }

    pub fn fail_submit_responses(&self, fail: bool) {
        self.configure(|inner| inner.fail_submit_responses = fail);
    }

    /// Makes every read (feedback, listings, questions) fail with a server error.
    pub fn fail_reads(&self, fail: bool) {
        self.configure(|inner| inner.fail_reads = fail);
    }

    /// Delays every call by `latency` (use with paused tokio time).
    pub fn set_latency(&self, latency: Duration) {
        self.configure(|inner| inner.latency = Some(latency));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner
            .lock()
            .map(|inner| inner.calls.clone())
            .unwrap_or_default()
    }

    async fn record(&self, call: ApiCall) -> Result<(), ApiError> {
        let latency = self.with_inner(|inner| {
            inner.calls.push(call);
            inner.latency
        })?;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    fn check_read(&self, detail: &str) -> Result<(), ApiError> {
        if self.with_inner(|inner| inner.fail_reads)? {
            return Err(server_error(detail));
        }
        Ok(())
    }
}

#[async_trait]
impl ClassroomApi for InMemoryApi {
    async fn grading_info(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<GradingInfo, ApiError> {
        self.record(ApiCall::GradingInfo(student_id, assignment_id))
            .await?;
        self.check_read("Fetching grading feedback failed")?;
        self.with_inner(|inner| {
            inner
                .grading
                .get(&(student_id, assignment_id))
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn course_grade_columns(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CourseGradeColumn>, ApiError> {
        self.record(ApiCall::CourseGradeColumns(course_id)).await?;
        self.check_read("Fetching all assignments failed")?;
        self.with_inner(|inner| inner.columns.get(&course_id).cloned())?
            .ok_or_else(|| not_found("Course not found"))
    }

    async fn update_grade(
        &self,
        assignment_id: AssignmentId,
        student_id: StudentId,
        question_id: QuestionId,
        grade: f64,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::UpdateGrade {
            assignment_id,
            student_id,
            question_id,
            grade,
        })
        .await?;
        self.with_inner(|inner| {
            if inner.failing_updates.contains(&question_id) {
                return Err(server_error("Updating grade failed"));
            }
            let info = inner.grading.entry((student_id, assignment_id)).or_default();
            if info.is_validated() {
                return Err(ApiError::Status {
                    status: StatusCode::BAD_REQUEST,
                    detail: "Grades already validated".into(),
                });
            }
            match info
                .grading_feedback
                .iter_mut()
                .find(|fb| fb.question_id == question_id)
            {
                Some(feedback) => feedback.record_edit(grade),
                None => {
                    let mut feedback = GradingFeedback::new(question_id, None);
                    feedback.record_edit(grade);
                    info.grading_feedback.push(feedback);
                }
            }
            Ok(())
        })?
    }

    async fn validate_assignment(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::Validate(student_id, assignment_id))
            .await?;
        self.with_inner(|inner| {
            if inner.fail_validation {
                return Err(server_error("Validating grade failed"));
            }
            inner
                .grading
                .entry((student_id, assignment_id))
                .or_default()
                .state = Some(true);
            Ok(())
        })?
    }

    async fn questions(&self, assignment_id: AssignmentId) -> Result<Vec<Question>, ApiError> {
        self.record(ApiCall::Questions(assignment_id)).await?;
        self.check_read("Fetching questions failed")?;
        self.with_inner(|inner| {
            inner
                .questions
                .get(&assignment_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn student_assignments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Vec<Assignment>, ApiError> {
        self.record(ApiCall::StudentAssignments(student_id, course_id))
            .await?;
        self.check_read("Fetching assignments student failed")?;
        self.with_inner(|inner| {
            inner
                .assignments
                .get(&(student_id, course_id))
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn create_questions(&self, request: &NewQuestions) -> Result<(), ApiError> {
        self.record(ApiCall::CreateQuestions(request.clone()))
            .await?;
        self.with_inner(|inner| {
            if inner.fail_create_questions {
                return Err(server_error("Question creation failed"));
            }
            let questions = inner.questions.entry(request.assignment_id).or_default();
            for new in &request.questions {
                let next = questions.iter().map(|q| q.id.value()).max().unwrap_or(0) + 1;
                questions.push(Question::new(
                    QuestionId::new(next),
                    new.question_text.clone(),
                    new.max_points,
                ));
            }
            Ok(())
        })?
    }

    async fn submit_responses(&self, submission: &ResponseSubmission) -> Result<(), ApiError> {
        self.record(ApiCall::SubmitResponses(submission.clone()))
            .await?;
        self.with_inner(|inner| {
            if inner.fail_submit_responses {
                return Err(server_error("Failed to submit student responses"));
            }
            let info = inner
                .grading
                .entry((submission.student_id, submission.assignment_id))
                .or_default();
            for response in &submission.responses {
                let mut feedback = GradingFeedback::new(response.question_id, None);
                feedback.response_text = Some(response.response_text.clone());
                info.grading_feedback.push(feedback);
            }
            Ok(())
        })?
    }
}
