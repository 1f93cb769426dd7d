use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Grade, comment and response for one (student, question) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GradingFeedback {
    pub question_id: QuestionId,
    #[serde(default)]
    pub grade: Option<f64>,
    /// Grade history kept by the backend once a grade has been edited: the
    /// original grade first (possibly null), then every new value.
    #[serde(default)]
    pub grades: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub response_text: Option<String>,
}

impl GradingFeedback {
    #[must_use]
    pub fn new(question_id: QuestionId, grade: Option<f64>) -> Self {
        Self {
            question_id,
            grade,
            ..Self::default()
        }
    }

    /// The grade as a number; absent or non-finite values count as zero.
    #[must_use]
    pub fn grade_or_zero(&self) -> f64 {
        self.grade.filter(|g| g.is_finite()).unwrap_or(0.0)
    }

    /// Whether the backend recorded an edit of this grade.
    #[must_use]
    pub fn has_pending_edit(&self) -> bool {
        self.grades.is_some()
    }

    /// Records `grade` the way the backend does: the history is seeded with
    /// the current grade, the new value is appended and becomes the grade.
    pub fn record_edit(&mut self, grade: f64) {
        let history = self.grades.get_or_insert_with(|| vec![self.grade]);
        history.push(Some(grade));
        self.grade = Some(grade);
    }
}

/// Aggregate grading view for one (student, assignment) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GradingInfo {
    #[serde(default)]
    pub grading_feedback: Vec<GradingFeedback>,
    #[serde(default)]
    pub advice: Option<String>,
    /// `Some(true)` once the teacher has validated the grades.
    #[serde(default)]
    pub state: Option<bool>,
}

impl GradingInfo {
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.state == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_feedback_endpoint_payload() {
        let raw = r#"{
            "grading_feedback": [
                {"response_text":"42","grade":1.5,"grades":null,"comment":"ok","question_id":1},
                {"response_text":"","grade":8.0,"grades":[null,6.0,8.0],"comment":null,"question_id":2}
            ],
            "advice": "Revise chapter 2",
            "state": null
        }"#;
        let info: GradingInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.grading_feedback.len(), 2);
        assert_eq!(info.grading_feedback[0].grade, Some(1.5));
        assert!(!info.grading_feedback[0].has_pending_edit());
        assert!(info.grading_feedback[1].has_pending_edit());
        assert_eq!(
            info.grading_feedback[1].grades,
            Some(vec![None, Some(6.0), Some(8.0)])
        );
        assert_eq!(info.grading_feedback[1].grade_or_zero(), 8.0);
        assert!(!info.is_validated());
    }

    #[test]
    fn decodes_grade_history_after_an_edit() {
        let raw = r#"{"grading_feedback":[{"question_id":3,"grade":8.0,"grades":[6.0,8.0],"comment":null,"response_text":"x"}],"advice":null,"state":false}"#;
        let info: GradingInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(
            info.grading_feedback[0].grades,
            Some(vec![Some(6.0), Some(8.0)])
        );
        assert!(info.grading_feedback[0].has_pending_edit());
    }

    #[test]
    fn record_edit_seeds_history_with_previous_grade() {
        let mut fb = GradingFeedback::new(QuestionId::new(1), None);
        fb.record_edit(4.0);
        fb.record_edit(5.5);
        assert_eq!(fb.grade, Some(5.5));
        assert_eq!(fb.grades, Some(vec![None, Some(4.0), Some(5.5)]));
    }

    #[test]
    fn non_finite_grade_counts_as_zero() {
        let fb = GradingFeedback::new(QuestionId::new(1), Some(f64::NAN));
        assert_eq!(fb.grade_or_zero(), 0.0);
    }
}
