use async_trait::async_trait;
use classroom_core::model::{AssignmentId, QuestionDraft};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Local store for unpublished question cards, keyed by assignment.
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Replace the stored drafts of an assignment with `drafts`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if two drafts share a position, or
    /// other storage errors.
    async fn save_drafts(
        &self,
        assignment_id: AssignmentId,
        drafts: &[QuestionDraft],
    ) -> Result<(), StorageError>;

    /// Load drafts ordered by position; empty when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the drafts cannot be read.
    async fn load_drafts(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<QuestionDraft>, StorageError>;

    /// Remove every draft of an assignment. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the drafts cannot be removed.
    async fn clear_drafts(&self, assignment_id: AssignmentId) -> Result<(), StorageError>;
}

pub(crate) fn check_positions(drafts: &[QuestionDraft]) -> Result<(), StorageError> {
    let mut seen = HashSet::with_capacity(drafts.len());
    if drafts.iter().all(|d| seen.insert(d.position)) {
        Ok(())
    } else {
        Err(StorageError::Conflict)
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    drafts: Arc<Mutex<HashMap<AssignmentId, Vec<QuestionDraft>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            drafts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl DraftRepository for InMemoryRepository {
    async fn save_drafts(
        &self,
        assignment_id: AssignmentId,
        drafts: &[QuestionDraft],
    ) -> Result<(), StorageError> {
        check_positions(drafts)?;
        let mut guard = self
            .drafts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut sorted = drafts.to_vec();
        sorted.sort_by_key(|d| d.position);
        guard.insert(assignment_id, sorted);
        Ok(())
    }

    async fn load_drafts(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<QuestionDraft>, StorageError> {
        let guard = self
            .drafts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&assignment_id).cloned().unwrap_or_default())
    }

    async fn clear_drafts(&self, assignment_id: AssignmentId) -> Result<(), StorageError> {
        let mut guard = self
            .drafts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&assignment_id);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub drafts: Arc<dyn DraftRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let drafts: Arc<dyn DraftRepository> = Arc::new(InMemoryRepository::new());
        Self { drafts }
    }
}
