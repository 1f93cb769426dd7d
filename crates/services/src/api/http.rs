use async_trait::async_trait;
use classroom_core::model::{
    Assignment, AssignmentId, CourseGradeColumn, CourseId, GradingInfo, Question, QuestionId,
    StudentId,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::{ClassroomApi, NewQuestions, ResponseSubmission};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::Session;

/// `reqwest`-backed client sending the session token as a bearer header.
#[derive(Clone)]
pub struct HttpClassroomApi {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpClassroomApi {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sends one request and returns the raw body of a 2xx response.
    ///
    /// Non-2xx responses become `ApiError::Status`, using the JSON `detail`
    /// string when the backend provides one and `fallback` otherwise.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
        fallback: &'static str,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.base_url.join(path)?;
        tracing::debug!(%method, path, "classroom api request");

        let request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(self.session.token());
        let response = build(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| fallback.to_string());
            tracing::warn!(%method, path, status = status.as_u16(), %detail, "classroom api request failed");
            return Err(ApiError::Status { status, detail });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &'static str,
    ) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, |r| r, fallback).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl ClassroomApi for HttpClassroomApi {
    async fn grading_info(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<GradingInfo, ApiError> {
        self.get_json(
            &format!("api/grading_feedback/{student_id}/{assignment_id}"),
            "Fetching grading feedback failed",
        )
        .await
    }

    async fn course_grade_columns(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CourseGradeColumn>, ApiError> {
        self.get_json(
            &format!("api/courses/{course_id}/all-assignments"),
            "Fetching all assignments failed",
        )
        .await
    }

    async fn update_grade(
        &self,
        assignment_id: AssignmentId,
        student_id: StudentId,
        question_id: QuestionId,
        grade: f64,
    ) -> Result<(), ApiError> {
        let path =
            format!("api/assignments/{assignment_id}/students/{student_id}/questions/{question_id}");
        self.execute(
            Method::PUT,
            &path,
            |r| r.query(&[("grade", grade.to_string())]),
            "Updating grade failed",
        )
        .await?;
        Ok(())
    }

    async fn validate_assignment(
        &self,
        student_id: StudentId,
        assignment_id: AssignmentId,
    ) -> Result<(), ApiError> {
        self.execute(
            Method::PUT,
            &format!("api/validate_assignment/{student_id}/{assignment_id}/"),
            |r| r.json(&json!({})),
            "Validating grade failed",
        )
        .await?;
        Ok(())
    }

    async fn questions(&self, assignment_id: AssignmentId) -> Result<Vec<Question>, ApiError> {
        self.get_json(
            &format!("api/questions/{assignment_id}"),
            "Fetching questions failed",
        )
        .await
    }

    async fn student_assignments(
        &self,
        student_id: StudentId,
        course_id: CourseId,
    ) -> Result<Vec<Assignment>, ApiError> {
        self.get_json(
            &format!("api/students/{student_id}/courses/{course_id}/assignments"),
            "Fetching assignments student failed",
        )
        .await
    }

    async fn create_questions(&self, request: &NewQuestions) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            "api/questions",
            |r| r.json(request),
            "Question creation failed",
        )
        .await?;
        Ok(())
    }

    async fn submit_responses(&self, submission: &ResponseSubmission) -> Result<(), ApiError> {
        self.execute(
            Method::POST,
            "api/student_responses/",
            |r| r.json(submission),
            "Failed to submit student responses",
        )
        .await?;
        Ok(())
    }
}
