use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use outdoorsy_core::{email_key, Review, ReviewRepository};

/// Process-local review store keyed by normalized email.
///
/// Safe for concurrent use without external locking; `add` is an atomic
/// insert-if-absent on the map entry.
#[derive(Debug, Default)]
pub struct InMemoryReviewRepository {
    reviews: DashMap<String, StoredReview>,
    next_seq: AtomicU64,
}

#[derive(Debug, Clone)]
struct StoredReview {
    seq: u64,
    review: Review,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn get_all(&self) -> Vec<Review> {
        let mut stored: Vec<StoredReview> = self
            .reviews
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        stored.sort_by_key(|entry| entry.seq);
        stored.into_iter().map(|entry| entry.review).collect()
    }

    async fn get_by_email(&self, email: &str) -> Option<Review> {
        let key = email_key(email)?;
        self.reviews.get(&key).map(|entry| entry.review.clone())
    }

    async fn add(&self, review: &Review) -> bool {
        let Some(key) = review.email_key() else {
            return false;
        };

        match self.reviews.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let review = Review {
                    id: Some(Uuid::new_v4().to_string()),
                    ..review.clone()
                };
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredReview { seq, review });
                true
            }
        }
    }

    async fn update(&self, review: &Review) -> bool {
        let Some(key) = review.email_key() else {
            return false;
        };

        match self.reviews.get_mut(&key) {
            Some(mut entry) => {
                let stored = &mut entry.review;
                let id = stored.id.take();
                let created_at = stored.created_at;
                *stored = Review {
                    id,
                    created_at,
                    ..review.clone()
                };
                true
            }
            None => false,
        }
    }

    async fn delete(&self, email: &str) -> bool {
        let Some(key) = email_key(email) else {
            return false;
        };
        self.reviews.remove(&key).is_some()
    }

    async fn exists(&self, email: &str) -> bool {
        email_key(email).is_some_and(|key| self.reviews.contains_key(&key))
    }
}
