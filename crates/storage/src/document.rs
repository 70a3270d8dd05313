use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::to_rfc3339;

/// SQLite result codes for constraint violations on `documents`.
const UNIQUE_VIOLATION: &str = "2067";
const PRIMARY_KEY_VIOLATION: &str = "1555";

/// A named collection of JSON documents inside a named database.
///
/// Every document carries a `doc_key`; the storage layer keeps it unique per
/// collection and all lookups are equality filters on it.
#[derive(Clone)]
pub struct DocumentCollection {
    pool: SqlitePool,
    database: String,
    collection: String,
}

/// A decoded document together with the identifier assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument<T> {
    pub id: String,
    pub body: T,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    body: String,
}

impl DocumentRow {
    fn decode<T: DeserializeOwned>(self) -> Result<StoredDocument<T>, DocumentError> {
        let body = serde_json::from_str(&self.body).map_err(|source| DocumentError::Decode {
            id: self.id.clone(),
            source,
        })?;
        Ok(StoredDocument { id: self.id, body })
    }
}

/// Result of attempting to insert a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { id: String },
    Duplicate,
}

impl InsertOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}

/// Error type for operations on a document collection.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to encode document: {0}")]
    Encode(serde_json::Error),
    #[error("failed to decode document {id}: {source}")]
    Decode {
        id: String,
        source: serde_json::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DocumentCollection {
    pub(crate) fn new(pool: SqlitePool, database: &str, collection: &str) -> Self {
        Self {
            pool,
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Lists every document in insertion order.
    ///
    /// Rows whose body no longer decodes as `T` are logged and left out so one
    /// corrupt document does not hide the rest.
    pub async fn find_all<T: DeserializeOwned>(
        &self,
    ) -> Result<Vec<StoredDocument<T>>, DocumentError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, body FROM documents \
             WHERE database_name = ? AND collection_name = ? \
             ORDER BY rowid",
        )
        .bind(&self.database)
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let documents = rows
            .into_iter()
            .filter_map(|row| match row.decode() {
                Ok(document) => Some(document),
                Err(err) => {
                    warn!(
                        stage = "storage",
                        database = %self.database,
                        collection = %self.collection,
                        error = %err,
                        "skipping undecodable document"
                    );
                    None
                }
            })
            .collect();
        Ok(documents)
    }

    /// Fetches the document stored under `key`.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<StoredDocument<T>>, DocumentError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, body FROM documents \
             WHERE database_name = ? AND collection_name = ? AND doc_key = ?",
        )
        .bind(&self.database)
        .bind(&self.collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DocumentRow::decode).transpose()
    }

    pub async fn count(&self, key: &str) -> Result<u64, DocumentError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents \
             WHERE database_name = ? AND collection_name = ? AND doc_key = ?",
        )
        .bind(&self.database)
        .bind(&self.collection)
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Inserts a document under `key`, assigning it a fresh identifier.
    ///
    /// A key that is already taken yields [`InsertOutcome::Duplicate`] rather
    /// than an error; the check happens inside the insert itself.
    pub async fn insert_one<T: Serialize>(
        &self,
        key: &str,
        body: &T,
    ) -> Result<InsertOutcome, DocumentError> {
        let body = serde_json::to_string(body).map_err(DocumentError::Encode)?;
        let id = Uuid::new_v4().to_string();
        let now = to_rfc3339(Utc::now());

        let result = sqlx::query(
            "INSERT INTO documents \
             (id, database_name, collection_name, doc_key, body, inserted_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&self.database)
        .bind(&self.collection)
        .bind(key)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted { id }),
            Err(sqlx::Error::Database(db_err)) => {
                let duplicate = matches!(
                    db_err.code().as_deref(),
                    Some(UNIQUE_VIOLATION | PRIMARY_KEY_VIOLATION)
                );
                if duplicate {
                    return Ok(InsertOutcome::Duplicate);
                }

                Err(DocumentError::Database(sqlx::Error::Database(db_err)))
            }
            Err(err) => Err(DocumentError::Database(err)),
        }
    }

    /// Replaces the body of the document stored under `key`.
    ///
    /// Returns the number of matched documents, which is `1` even when the new
    /// body equals the old one.
    pub async fn replace_one<T: Serialize>(
        &self,
        key: &str,
        body: &T,
    ) -> Result<u64, DocumentError> {
        let body = serde_json::to_string(body).map_err(DocumentError::Encode)?;

        let result = sqlx::query(
            "UPDATE documents SET body = ?, updated_at = ? \
             WHERE database_name = ? AND collection_name = ? AND doc_key = ?",
        )
        .bind(&body)
        .bind(to_rfc3339(Utc::now()))
        .bind(&self.database)
        .bind(&self.collection)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes the document stored under `key`, returning how many were deleted.
    pub async fn delete_one(&self, key: &str) -> Result<u64, DocumentError> {
        let result = sqlx::query(
            "DELETE FROM documents \
             WHERE database_name = ? AND collection_name = ? AND doc_key = ?",
        )
        .bind(&self.database)
        .bind(&self.collection)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_store;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn note(text: &str) -> Note {
        Note {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_returns_duplicate_on_conflict() {
        let (_dir, store) = setup_store().await;
        let notes = store.collection("app", "notes");

        let outcome = notes.insert_one("k1", &note("first")).await.expect("insert");
        assert!(matches!(outcome, InsertOutcome::Inserted { .. }));

        let outcome = notes
            .insert_one("k1", &note("second"))
            .await
            .expect("duplicate should be ok");
        assert!(outcome.is_duplicate());

        let stored: StoredDocument<Note> = notes
            .find_one("k1")
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(stored.body, note("first"));
    }

    #[tokio::test]
    async fn collections_and_databases_are_isolated() {
        let (_dir, store) = setup_store().await;
        let first = store.collection("app", "notes");
        let other_collection = store.collection("app", "drafts");
        let other_database = store.collection("archive", "notes");

        first.insert_one("k1", &note("a")).await.expect("insert");
        assert!(!other_collection
            .insert_one("k1", &note("b"))
            .await
            .expect("insert")
            .is_duplicate());
        assert!(!other_database
            .insert_one("k1", &note("c"))
            .await
            .expect("insert")
            .is_duplicate());

        assert_eq!(first.find_all::<Note>().await.expect("list").len(), 1);
        assert_eq!(first.count("k1").await.expect("count"), 1);
        assert_eq!(first.count("k2").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let (_dir, store) = setup_store().await;
        let notes = store.collection("app", "notes");
        for key in ["c", "a", "b"] {
            notes.insert_one(key, &note(key)).await.expect("insert");
        }

        let texts: Vec<String> = notes
            .find_all::<Note>()
            .await
            .expect("list")
            .into_iter()
            .map(|doc| doc.body.text)
            .collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn replace_counts_matches_even_without_changes() {
        let (_dir, store) = setup_store().await;
        let notes = store.collection("app", "notes");

        assert_eq!(notes.replace_one("k1", &note("x")).await.expect("replace"), 0);

        notes.insert_one("k1", &note("x")).await.expect("insert");
        assert_eq!(notes.replace_one("k1", &note("y")).await.expect("replace"), 1);
        assert_eq!(notes.replace_one("k1", &note("y")).await.expect("replace"), 1);
        assert_eq!(
            notes
                .find_one::<Note>("k1")
                .await
                .expect("find")
                .expect("present")
                .body,
            note("y")
        );
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let (_dir, store) = setup_store().await;
        let notes = store.collection("app", "notes");
        notes.insert_one("k1", &note("x")).await.expect("insert");

        assert_eq!(notes.delete_one("k1").await.expect("delete"), 1);
        assert_eq!(notes.delete_one("k1").await.expect("delete"), 0);
        assert!(notes.find_one::<Note>("k1").await.expect("find").is_none());
    }

    async fn insert_raw(store: &crate::DocumentStore, id: &str, key: &str, body: &str) {
        sqlx::query(
            "INSERT INTO documents \
             (id, database_name, collection_name, doc_key, body, inserted_at, updated_at) \
             VALUES (?, 'app', 'notes', ?, ?, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .bind(id)
        .bind(key)
        .bind(body)
        .execute(store.pool())
        .await
        .expect("insert raw row");
    }

    #[tokio::test]
    async fn malformed_body_surfaces_decode_error() {
        let (_dir, store) = setup_store().await;
        insert_raw(&store, "bad-1", "k1", "not json").await;

        let err = store
            .collection("app", "notes")
            .find_one::<Note>("k1")
            .await
            .expect_err("decode should fail");
        assert!(matches!(err, DocumentError::Decode { ref id, .. } if id == "bad-1"));
    }

    #[tokio::test]
    async fn find_all_skips_undecodable_documents() {
        let (_dir, store) = setup_store().await;
        let notes = store.collection("app", "notes");
        notes.insert_one("a", &note("first")).await.expect("insert");
        insert_raw(&store, "bad-1", "b", "not json").await;
        insert_raw(&store, "bad-2", "c", r#"{"other":1}"#).await;
        notes.insert_one("d", &note("last")).await.expect("insert");

        let texts: Vec<String> = notes
            .find_all::<Note>()
            .await
            .expect("list")
            .into_iter()
            .map(|doc| doc.body.text)
            .collect();
        assert_eq!(texts, vec!["first", "last"]);
    }
}
