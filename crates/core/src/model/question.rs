use serde::{Deserialize, Serialize};

use crate::model::ids::{AssignmentId, QuestionId};

/// A question attached to an assignment, as served by `/api/questions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question_text")]
    pub text: String,
    pub max_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<AssignmentId>,
    /// Per-assignment question number. Grading feedback refers to this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassigned_id: Option<QuestionId>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: impl Into<String>, max_points: u32) -> Self {
        Self {
            id,
            text: text.into(),
            max_points,
            assignment_id: None,
            reassigned_id: None,
        }
    }

    /// Key under which this question's feedback is filed.
    #[must_use]
    pub fn feedback_key(&self) -> QuestionId {
        self.reassigned_id.unwrap_or(self.id)
    }
}
