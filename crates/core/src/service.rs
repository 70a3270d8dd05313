use std::sync::Arc;

use tracing::{info, warn};

use crate::{outcome::OperationResult, repository::ReviewRepository, review::Review};

/// Review submission and moderation rules on top of a [`ReviewRepository`].
#[derive(Clone)]
pub struct ReviewService {
    repository: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(repository: Arc<dyn ReviewRepository>) -> Self {
        Self { repository }
    }

    /// Accepts a review unless it is invalid or its email already has one.
    pub async fn submit_review(&self, review: Review) -> OperationResult {
        if review.email.trim().is_empty() {
            return OperationResult::failure("Invalid review data");
        }

        if let Err(errors) = review.validate() {
            return OperationResult::failure(errors.first_message());
        }

        if self.repository.exists(&review.email).await {
            return OperationResult::failure("A review from this email already exists");
        }

        // The backends enforce email uniqueness on insert, so a concurrent
        // submission that slipped past `exists` also lands here.
        if !self.repository.add(&review).await {
            warn!(stage = "reviews", email = %review.email, "review could not be stored");
            return OperationResult::failure("Failed to submit review");
        }

        info!(
            stage = "reviews",
            name = %review.name,
            email = %review.email,
            "new review submitted"
        );
        OperationResult::success(format!("Thanks for your review, {}!", review.name))
    }

    pub async fn delete_review_by_email(&self, email: &str) -> OperationResult {
        if email.trim().is_empty() {
            return OperationResult::failure("Invalid email address");
        }

        if self.repository.get_by_email(email).await.is_none() {
            return OperationResult::failure("No review found for this email");
        }

        if !self.repository.delete(email).await {
            warn!(stage = "reviews", %email, "review could not be deleted");
            return OperationResult::failure("Failed to delete review");
        }

        info!(stage = "reviews", %email, "review deleted");
        OperationResult::success("Review deleted successfully")
    }

    pub async fn get_all_reviews(&self) -> Vec<Review> {
        self.repository.get_all().await
    }

    /// Reviews visible on the public listing.
    pub async fn get_approved_reviews(&self) -> Vec<Review> {
        self.repository
            .get_all()
            .await
            .into_iter()
            .filter(|review| review.is_approved)
            .collect()
    }
}
