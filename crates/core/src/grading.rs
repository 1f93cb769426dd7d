//! Grade aggregation, validation state and the controlled grading form.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{GradingFeedback, GradingInfo, Question, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GradeError {
    #[error("grades are validated and can no longer be edited")]
    Locked,

    #[error("question {0} is not part of this assignment")]
    UnknownQuestion(QuestionId),

    #[error("grade must be a finite number")]
    NotFinite,

    #[error("grade cannot be negative (got {0})")]
    Negative(f64),

    #[error("grade {grade} exceeds the {max_points} points of question {question_id}")]
    AboveMaximum {
        question_id: QuestionId,
        grade: f64,
        max_points: u32,
    },
}

//
// ─── AGGREGATES ────────────────────────────────────────────────────────────────
//

/// Sum of `max_points` over all questions; 0 when absent or empty.
#[must_use]
pub fn total_points(questions: Option<&[Question]>) -> u32 {
    questions
        .unwrap_or_default()
        .iter()
        .map(|q| q.max_points)
        .sum()
}

/// Sum of grades over all feedback entries; missing grades count as 0.
#[must_use]
pub fn total_grade(feedback: Option<&[GradingFeedback]>) -> f64 {
    feedback
        .unwrap_or_default()
        .iter()
        .map(GradingFeedback::grade_or_zero)
        .sum()
}

/// Indexes feedback by question; a duplicated question id keeps the last entry.
#[must_use]
pub fn grading_map(feedback: &[GradingFeedback]) -> HashMap<QuestionId, &GradingFeedback> {
    feedback.iter().map(|fb| (fb.question_id, fb)).collect()
}

/// True when any entry carries an edited value the backend has not settled yet.
#[must_use]
pub fn has_modified(feedback: Option<&[GradingFeedback]>) -> bool {
    feedback
        .unwrap_or_default()
        .iter()
        .any(GradingFeedback::has_pending_edit)
}

#[must_use]
pub fn has_validated_grades(info: Option<&GradingInfo>) -> bool {
    info.is_some_and(GradingInfo::is_validated)
}

//
// ─── VALIDATION STATE ──────────────────────────────────────────────────────────
//

/// Lifecycle of the grades of one (student, assignment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeState {
    /// No grade recorded yet.
    Ungraded,
    /// At least one grade entered, not yet confirmed.
    Provisional,
    /// Confirmed by the teacher. Terminal.
    Validated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeEvent {
    GradeEntered,
    Confirmed,
}

impl GradeState {
    /// Derives the state from what the backend reports.
    #[must_use]
    pub fn of(info: Option<&GradingInfo>) -> Self {
        match info {
            Some(info) if info.is_validated() => Self::Validated,
            Some(info) if info.grading_feedback.iter().any(|fb| fb.grade.is_some()) => {
                Self::Provisional
            }
            _ => Self::Ungraded,
        }
    }

    /// # Errors
    ///
    /// Returns `GradeError::Locked` for any event once validated.
    pub fn apply(self, event: GradeEvent) -> Result<Self, GradeError> {
        match (self, event) {
            (Self::Validated, _) => Err(GradeError::Locked),
            (_, GradeEvent::GradeEntered) => Ok(Self::Provisional),
            (_, GradeEvent::Confirmed) => Ok(Self::Validated),
        }
    }

    #[must_use]
    pub fn is_locked(self) -> bool {
        self == Self::Validated
    }
}

//
// ─── GRADE FORM ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    max_points: u32,
    value: f64,
}

/// Editable grades for one (student, assignment), indexed by feedback key.
///
/// Values start from the stored grades (missing ones at 0). Edits are kept in
/// first-insertion order, which is the order they are submitted in.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeForm {
    slots: HashMap<QuestionId, Slot>,
    edits: Vec<QuestionId>,
    state: GradeState,
}

impl GradeForm {
    #[must_use]
    pub fn new(questions: &[Question], info: Option<&GradingInfo>) -> Self {
        let feedback = info.map(|i| grading_map(&i.grading_feedback)).unwrap_or_default();
        let slots = questions
            .iter()
            .map(|q| {
                let key = q.feedback_key();
                let value = feedback.get(&key).map_or(0.0, |fb| fb.grade_or_zero());
                (
                    key,
                    Slot {
                        max_points: q.max_points,
                        value,
                    },
                )
            })
            .collect();
        Self {
            slots,
            edits: Vec::new(),
            state: GradeState::of(info),
        }
    }

    #[must_use]
    pub fn state(&self) -> GradeState {
        self.state
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }

    #[must_use]
    pub fn value(&self, question_id: QuestionId) -> Option<f64> {
        self.slots.get(&question_id).map(|s| s.value)
    }

    /// Sum of the current form values.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.slots.values().map(|s| s.value).sum()
    }

    /// Records a new grade for a question.
    ///
    /// # Errors
    ///
    /// Returns `GradeError::Locked` once validated, `GradeError::UnknownQuestion`
    /// for a key outside the form, and a range error for a grade that is not
    /// finite, negative, or above the question's maximum.
    pub fn set_grade(&mut self, question_id: QuestionId, grade: f64) -> Result<(), GradeError> {
        if self.is_locked() {
            return Err(GradeError::Locked);
        }
        let slot = self
            .slots
            .get_mut(&question_id)
            .ok_or(GradeError::UnknownQuestion(question_id))?;
        if !grade.is_finite() {
            return Err(GradeError::NotFinite);
        }
        if grade < 0.0 {
            return Err(GradeError::Negative(grade));
        }
        if grade > f64::from(slot.max_points) {
            return Err(GradeError::AboveMaximum {
                question_id,
                grade,
                max_points: slot.max_points,
            });
        }

        slot.value = grade;
        if !self.edits.contains(&question_id) {
            self.edits.push(question_id);
        }
        self.state = self.state.apply(GradeEvent::GradeEntered)?;
        Ok(())
    }

    /// Pending edits in the order they were first made.
    #[must_use]
    pub fn edits(&self) -> Vec<(QuestionId, f64)> {
        self.edits
            .iter()
            .filter_map(|id| self.slots.get(id).map(|s| (*id, s.value)))
            .collect()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Drops the edit buffer; values stay as displayed.
    pub fn clear_edits(&mut self) {
        self.edits.clear();
    }

    /// Locks the form after a successful validation.
    ///
    /// # Errors
    ///
    /// Returns `GradeError::Locked` if it was already validated.
    pub fn mark_validated(&mut self) -> Result<(), GradeError> {
        self.state = self.state.apply(GradeEvent::Confirmed)?;
        self.edits.clear();
        Ok(())
    }
}
