use async_trait::async_trait;

use crate::review::Review;

/// Storage capability for reviews, keyed by email.
///
/// Implementations compare emails through [`crate::email_key`], so lookups are
/// case-insensitive. Storage faults never escape: they surface as an empty
/// list, `None` or `false`.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Every stored review in a stable order.
    async fn get_all(&self) -> Vec<Review>;

    /// The review stored for `email`, or `None` for blank input or no match.
    async fn get_by_email(&self, email: &str) -> Option<Review>;

    /// Stores a new review under a freshly assigned id; any id already set on
    /// `review` is ignored. Returns `false` when the email is blank, already
    /// taken, or the backend failed.
    async fn add(&self, review: &Review) -> bool;

    /// Replaces the review stored under the same email, keeping its id and
    /// creation time. Returns `true` when a stored review matched.
    async fn update(&self, review: &Review) -> bool;

    /// Removes the review stored for `email`. Returns `true` only if one was removed.
    async fn delete(&self, email: &str) -> bool;

    async fn exists(&self, email: &str) -> bool;
}
