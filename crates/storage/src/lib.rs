//! Review storage backends: an in-process map and a SQLite-backed document store.

pub mod document;
pub mod memory;
pub mod reviews;

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;

pub use document::{DocumentCollection, DocumentError, InsertOutcome, StoredDocument};
pub use memory::InMemoryReviewRepository;
pub use reviews::DocumentReviewRepository;

/// Top-level handle on the document store; owns the SQLite connection pool.
///
/// Cloning is cheap and every clone shares the pool, so one store serves all
/// concurrent requests of the process.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    /// Opens a connection pool for the provided connection string, creating the
    /// database file when it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle on one named collection of one named database.
    pub fn collection(&self, database: &str, collection: &str) -> DocumentCollection {
        DocumentCollection::new(self.pool.clone(), database, collection)
    }

    /// Returns the review repository backed by the given collection.
    pub fn reviews(&self, database: &str, collection: &str) -> DocumentReviewRepository {
        DocumentReviewRepository::new(self.collection(database, collection))
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to document store: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
