use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("question {position} has no text")]
    EmptyQuestion { position: u32 },

    #[error("no draft card at position {0}")]
    UnknownCard(u32),

    #[error("an assignment needs at least one question")]
    NoQuestions,
}

//
// ─── QUESTION DRAFT ────────────────────────────────────────────────────────────
//

/// An unsaved question card in the compose workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// 1-based card number, unique inside a draft set.
    pub position: u32,
    pub question_text: String,
    pub teacher_answer: String,
    pub max_points: u32,
}

impl QuestionDraft {
    #[must_use]
    pub fn blank(position: u32) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

//
// ─── DRAFT SET ─────────────────────────────────────────────────────────────────
//

/// Ordered set of question cards being composed for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftSet {
    cards: Vec<QuestionDraft>,
}

impl DraftSet {
    /// A fresh set holds a single blank card.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: vec![QuestionDraft::blank(1)],
        }
    }

    /// Rebuilds a set from stored cards; an empty store yields a fresh set.
    #[must_use]
    pub fn from_cards(mut cards: Vec<QuestionDraft>) -> Self {
        if cards.is_empty() {
            return Self::new();
        }
        cards.sort_by_key(|c| c.position);
        Self { cards }
    }

    #[must_use]
    pub fn cards(&self) -> &[QuestionDraft] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn next_position(&self) -> u32 {
        self.cards.iter().map(|c| c.position).max().unwrap_or(0) + 1
    }

    /// Appends a blank card and returns its position.
    pub fn add_blank(&mut self) -> u32 {
        let position = self.next_position();
        self.cards.push(QuestionDraft::blank(position));
        position
    }

    /// Appends a copy of the card at `position` and returns the copy's position.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::UnknownCard` if no card has that position.
    pub fn duplicate(&mut self, position: u32) -> Result<u32, DraftError> {
        let source = self
            .cards
            .iter()
            .find(|c| c.position == position)
            .cloned()
            .ok_or(DraftError::UnknownCard(position))?;
        let new_position = self.next_position();
        self.cards.push(QuestionDraft {
            position: new_position,
            ..source
        });
        Ok(new_position)
    }

    /// # Errors
    ///
    /// Returns `DraftError::UnknownCard` if no card has that position.
    pub fn remove(&mut self, position: u32) -> Result<QuestionDraft, DraftError> {
        let index = self
            .cards
            .iter()
            .position(|c| c.position == position)
            .ok_or(DraftError::UnknownCard(position))?;
        Ok(self.cards.remove(index))
    }

    /// # Errors
    ///
    /// Returns `DraftError::UnknownCard` if no card has that position.
    pub fn card_mut(&mut self, position: u32) -> Result<&mut QuestionDraft, DraftError> {
        self.cards
            .iter_mut()
            .find(|c| c.position == position)
            .ok_or(DraftError::UnknownCard(position))
    }

    /// Checks the set can be published as questions.
    ///
    /// # Errors
    ///
    /// Returns `DraftError::NoQuestions` for an empty set and
    /// `DraftError::EmptyQuestion` for the first card without text.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.cards.is_empty() {
            return Err(DraftError::NoQuestions);
        }
        if let Some(card) = self.cards.iter().find(|c| c.question_text.trim().is_empty()) {
            return Err(DraftError::EmptyQuestion {
                position: card.position,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn into_cards(self) -> Vec<QuestionDraft> {
        self.cards
    }
}
