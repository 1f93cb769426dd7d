use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AssignmentId, StudentId};
use crate::time::optional_timestamp;

/// Assignment header carried by the course grade listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentHeader {
    pub id: AssignmentId,
    pub title: String,
    #[serde(default, with = "optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: Option<u32>,
}

/// A student's summed grade for one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentTotal {
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub postname: String,
    #[serde(default)]
    pub email: String,
    /// `None` while no response of this student has been graded.
    #[serde(default)]
    pub total_grade: Option<f64>,
}

/// One entry of `/api/courses/{id}/all-assignments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseGradeColumn {
    pub assignment: AssignmentHeader,
    #[serde(default)]
    pub students: Vec<StudentTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_assignments_entry() {
        let raw = r#"[{
            "assignment": {"id": 3, "title": "Quiz 2 algebra", "due_date": null, "points": 10},
            "students": [
                {"id": 1, "name": "Ada", "postname": "Lovelace", "email": "ada@example.org", "total_grade": 7.5},
                {"id": 2, "name": "Alan", "postname": "Turing", "email": "alan@example.org", "total_grade": null}
            ]
        }]"#;
        let columns: Vec<CourseGradeColumn> = serde_json::from_str(raw).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].assignment.points, Some(10));
        assert_eq!(columns[0].students[0].total_grade, Some(7.5));
        assert_eq!(columns[0].students[1].total_grade, None);
    }
}
