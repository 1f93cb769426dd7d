//! `SQLite` backing for the local draft store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{DraftRepository, Storage};

mod draft_repo;
mod mapping;
mod migrate;

/// Question drafts kept in a single `SQLite` file.
#[derive(Clone)]
pub struct SqliteDraftStore {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteDraftStore {
    /// Open the store at `database_url`, creating the file and the
    /// `question_drafts` table when missing.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn open(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

impl Storage {
    /// Build a `Storage` whose drafts live in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the store cannot be opened.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let store = SqliteDraftStore::open(database_url).await?;
        let drafts: Arc<dyn DraftRepository> = Arc::new(store);
        Ok(Self { drafts })
    }
}
