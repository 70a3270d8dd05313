use async_trait::async_trait;
use tracing::{debug, warn};

use outdoorsy_core::{email_key, Review, ReviewRepository};

use crate::document::{DocumentCollection, DocumentError, InsertOutcome, StoredDocument};

/// Review repository persisted as documents keyed by normalized email.
///
/// This is the only place document errors are handled: each one is logged and
/// turned into the repository's `false` / `None` / empty contract.
#[derive(Clone)]
pub struct DocumentReviewRepository {
    collection: DocumentCollection,
}

impl DocumentReviewRepository {
    pub fn new(collection: DocumentCollection) -> Self {
        Self { collection }
    }

    fn report(&self, operation: &'static str, err: &DocumentError) {
        warn!(
            stage = "storage",
            database = self.collection.database(),
            collection = self.collection.name(),
            operation,
            error = %err,
            "review collection operation failed"
        );
    }
}

fn into_review(document: StoredDocument<Review>) -> Review {
    Review {
        id: Some(document.id),
        ..document.body
    }
}

fn document_body(review: &Review) -> Review {
    Review {
        id: None,
        ..review.clone()
    }
}

#[async_trait]
impl ReviewRepository for DocumentReviewRepository {
    async fn get_all(&self) -> Vec<Review> {
        match self.collection.find_all::<Review>().await {
            Ok(documents) => documents.into_iter().map(into_review).collect(),
            Err(err) => {
                self.report("get_all", &err);
                Vec::new()
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Option<Review> {
        let key = email_key(email)?;
        match self.collection.find_one::<Review>(&key).await {
            Ok(document) => document.map(into_review),
            Err(err) => {
                self.report("get_by_email", &err);
                None
            }
        }
    }

    async fn add(&self, review: &Review) -> bool {
        let Some(key) = review.email_key() else {
            return false;
        };

        match self.collection.insert_one(&key, &document_body(review)).await {
            Ok(InsertOutcome::Inserted { id }) => {
                debug!(stage = "storage", %id, "review document inserted");
                true
            }
            Ok(InsertOutcome::Duplicate) => false,
            Err(err) => {
                self.report("add", &err);
                false
            }
        }
    }

    async fn update(&self, review: &Review) -> bool {
        let Some(key) = review.email_key() else {
            return false;
        };

        let existing = match self.collection.find_one::<Review>(&key).await {
            Ok(Some(document)) => document.body,
            Ok(None) => return false,
            Err(err) => {
                self.report("update", &err);
                return false;
            }
        };

        let replacement = Review {
            created_at: existing.created_at,
            ..document_body(review)
        };
        match self.collection.replace_one(&key, &replacement).await {
            Ok(matched) => matched > 0,
            Err(err) => {
                self.report("update", &err);
                false
            }
        }
    }

    async fn delete(&self, email: &str) -> bool {
        let Some(key) = email_key(email) else {
            return false;
        };

        match self.collection.delete_one(&key).await {
            Ok(deleted) => deleted > 0,
            Err(err) => {
                self.report("delete", &err);
                false
            }
        }
    }

    async fn exists(&self, email: &str) -> bool {
        let Some(key) = email_key(email) else {
            return false;
        };

        match self.collection.count(&key).await {
            Ok(count) => count > 0,
            Err(err) => {
                self.report("exists", &err);
                false
            }
        }
    }
}
