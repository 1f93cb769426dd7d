//! Client contract for the classroom REST backend.

use async_trait::async_trait;
use classroom_core::model::{
    Assignment, AssignmentId, CourseGradeColumn, CourseId, GradingInfo, Question, QuestionDraft,
    QuestionId, StudentId,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

mod http;
mod memory;

pub use http::HttpClassroomApi;
pub use memory::{ApiCall, InMemoryApi};

/// Operations the grading client needs from the backend.
#[async_trait]
pub trait ClassroomApi: Send + Sync {
    /// `GET /api/grading_feedback/{student}/{assignment}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be decoded.
    async fn grading_info(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<GradingInfo, ApiError>;

    /// `GET /api/courses/{course}/all-assignments`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be decoded.
    async fn course_grade_columns(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CourseGradeColumn>, ApiError>;

    /// Stores one question grade for a student.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the update.
    async fn update_grade(
        &self,
        assignment_id: AssignmentId,
        student_id: StudentId,
        question_id: QuestionId,
        grade: f64,
    ) -> Result<(), ApiError>;

    /// Locks the grades of a student for an assignment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the validation.
    async fn validate_assignment(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be decoded.
    async fn questions(&self, assignment_id: AssignmentId) -> Result<Vec<Question>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be decoded.
    async fn student_assignments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Vec<Assignment>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the questions.
    async fn create_questions(&self, request: &NewQuestions) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the responses.
    async fn submit_responses(&self, submission: &ResponseSubmission) -> Result<(), ApiError>;
}

//
// ─── REQUEST BODIES ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherAnswer {
    pub answer_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub max_points: u32,
    pub teacher_answers: Vec<TeacherAnswer>,
}

/// Body of `POST /api/questions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestions {
    pub assignment_id: AssignmentId,
    pub questions: Vec<NewQuestion>,
}

impl NewQuestions {
    /// Builds the request from draft cards; a blank teacher answer is sent as no answer.
    #[must_use]
    pub fn from_drafts(assignment_id: AssignmentId, drafts: &[QuestionDraft]) -> Self {
        let questions = drafts
            .iter()
            .map(|d| NewQuestion {
                question_text: d.question_text.trim().to_string(),
                max_points: d.max_points,
                teacher_answers: if d.teacher_answer.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![TeacherAnswer {
                        answer_text: d.teacher_answer.trim().to_string(),
                    }]
                },
            })
            .collect();
        Self {
            assignment_id,
            questions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub question_id: QuestionId,
    pub response_text: String,
    /// Attachments are not uploaded by this client; always serialized as `null`.
    pub file: Option<String>,
}

/// Body of `POST /api/student_responses/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSubmission {
    pub assignment_id: AssignmentId,
    pub student_id: StudentId,
    pub responses: Vec<StudentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_questions_body_matches_backend_shape() {
        let drafts = [
            QuestionDraft {
                position: 1,
                question_text: " Define a prime ".into(),
                teacher_answer: "Divisible only by 1 and itself".into(),
                max_points: 3,
            },
            QuestionDraft {
                position: 2,
                question_text: "Give an example".into(),
                teacher_answer: "  ".into(),
                max_points: 1,
            },
        ];
        let body = serde_json::to_value(NewQuestions::from_drafts(AssignmentId::new(8), &drafts))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "assignment_id": 8,
                "questions": [
                    {
                        "question_text": "Define a prime",
                        "max_points": 3,
                        "teacher_answers": [{"answer_text": "Divisible only by 1 and itself"}]
                    },
                    {"question_text": "Give an example", "max_points": 1, "teacher_answers": []}
                ]
            })
        );
    }

    #[test]
    fn response_file_serializes_as_null() {
        let body = ResponseSubmission {
            assignment_id: AssignmentId::new(2),
            student_id: StudentId::new(5),
            responses: vec![StudentResponse {
                question_id: QuestionId::new(1),
                response_text: "42".into(),
                file: None,
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "assignment_id": 2,
                "student_id": 5,
                "responses": [{"question_id": 1, "response_text": "42", "file": null}]
            })
        );
    }
}
