use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AssignmentId, CourseId};
use crate::time::optional_timestamp;

/// An assignment (exam) as listed for a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub title: String,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default, with = "optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: u32,
    /// `false` while the assignment is still a draft without questions.
    #[serde(default, rename = "composition")]
    pub composed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
}

impl Assignment {
    /// Whether questions have been attached and the assignment can be answered and graded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.composed
    }

    /// Submissions are refused once the deadline has passed.
    #[must_use]
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now)
    }

    /// First whitespace-delimited token of the title, used as a column header.
    #[must_use]
    pub fn short_title(&self) -> &str {
        short_title(&self.title)
    }
}

/// Truncates a title to its first whitespace-delimited token.
#[must_use]
pub fn short_title(title: &str) -> &str {
    title.split_whitespace().next().unwrap_or("")
}
