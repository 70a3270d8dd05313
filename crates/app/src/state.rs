use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use outdoorsy_core::{ReviewRepository, ReviewService};
use outdoorsy_media::{BlobImageResolver, ImageUrlResolver, LocalImageResolver, LocalImages};
use outdoorsy_storage::{DocumentStore, InMemoryReviewRepository, StorageError};
use outdoorsy_util::{AppConfig, StoreConfig};

/// Services shared by every request, wired once at startup from [`AppConfig`].
#[derive(Clone)]
pub struct AppState {
    reviews: ReviewService,
    images: Arc<dyn ImageUrlResolver>,
    backend: &'static str,
}

impl AppState {
    /// Selects the review backend and image strategy the configuration asks for.
    pub async fn build(config: &AppConfig) -> Result<Self, AppStateError> {
        let repository = build_repository(&config.store).await?;
        let images = build_image_resolver(config);

        info!(
            stage = "app",
            backend = config.store.as_str(),
            images = images.kind(),
            web_root = %config.web_root.display(),
            "application state built"
        );

        Ok(Self {
            reviews: ReviewService::new(repository),
            images,
            backend: config.store.as_str(),
        })
    }

    pub fn reviews(&self) -> &ReviewService {
        &self.reviews
    }

    pub fn images(&self) -> &dyn ImageUrlResolver {
        self.images.as_ref()
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

async fn build_repository(
    store: &StoreConfig,
) -> Result<Arc<dyn ReviewRepository>, AppStateError> {
    match store {
        StoreConfig::Memory => Ok(Arc::new(InMemoryReviewRepository::new())),
        StoreConfig::Document(settings) => {
            let store = DocumentStore::connect(&settings.connection_string).await?;
            store.run_migrations().await?;
            Ok(Arc::new(
                store.reviews(&settings.database_name, &settings.collection_name),
            ))
        }
    }
}

fn build_image_resolver(config: &AppConfig) -> Arc<dyn ImageUrlResolver> {
    let local = LocalImages::new(config.web_root.clone());
    match &config.blob {
        Some(blob) => Arc::new(BlobImageResolver::new(blob.clone(), local)),
        None => Arc::new(LocalImageResolver::new(local)),
    }
}

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("failed to open review store: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    use outdoorsy_core::Review;
    use outdoorsy_media::{RequestOrigin, IMAGES_DIR};
    use outdoorsy_util::{BlobConfig, DocumentStoreConfig, Environment};
    use tempfile::TempDir;

    fn config(store: StoreConfig, blob: Option<BlobConfig>, web_root: &Path) -> AppConfig {
        AppConfig {
            environment: Environment::Test,
            store,
            blob,
            web_root: web_root.to_path_buf(),
        }
    }

    fn document_store(dir: &TempDir) -> StoreConfig {
        StoreConfig::Document(DocumentStoreConfig {
            connection_string: format!("sqlite://{}", dir.path().join("reviews.db").display()),
            database_name: "outdoorsy".to_string(),
            collection_name: "reviews".to_string(),
        })
    }

    fn origin() -> RequestOrigin {
        RequestOrigin::new("https", "outdoorsy.example")
    }

    async fn assert_review_lifecycle(state: &AppState) {
        let reviews = state.reviews();

        let submitted = reviews
            .submit_review(Review::new("Ann", "a@x.com", "Great trip!"))
            .await;
        assert!(submitted.is_success());
        assert_eq!(submitted.message(), "Thanks for your review, Ann!");

        let duplicate = reviews
            .submit_review(Review::new("Ann", "A@X.com", "Great trip!"))
            .await;
        assert!(!duplicate.is_success());
        assert_eq!(duplicate.message(), "A review from this email already exists");

        let listed = reviews.get_all_reviews().await;
        assert_eq!(
            listed
                .iter()
                .filter(|review| review.email.eq_ignore_ascii_case("a@x.com"))
                .count(),
            1
        );

        let deleted = reviews.delete_review_by_email("a@x.com").await;
        assert!(deleted.is_success());
        assert_eq!(deleted.message(), "Review deleted successfully");

        let missing = reviews.delete_review_by_email("a@x.com").await;
        assert!(!missing.is_success());
        assert_eq!(missing.message(), "No review found for this email");
    }

    #[tokio::test]
    async fn memory_backend_runs_review_lifecycle() {
        let root = tempfile::tempdir().expect("tempdir");
        let state = AppState::build(&config(StoreConfig::Memory, None, root.path()))
            .await
            .expect("state builds");

        assert_eq!(state.backend(), "memory");
        assert_review_lifecycle(&state).await;
    }

    #[tokio::test]
    async fn document_backend_runs_review_lifecycle_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app_config = config(document_store(&dir), None, dir.path());

        let state = AppState::build(&app_config).await.expect("state builds");
        assert_eq!(state.backend(), "document");
        assert_review_lifecycle(&state).await;

        let kept = state
            .reviews()
            .submit_review(Review::new("Bob", "b@x.com", "Lovely hike"))
            .await;
        assert!(kept.is_success());

        let reopened = AppState::build(&app_config).await.expect("state rebuilds");
        let approved = reopened.reviews().get_approved_reviews().await;
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].name, "Bob");
    }

    #[tokio::test]
    async fn unreachable_document_store_fails_startup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = StoreConfig::Document(DocumentStoreConfig {
            connection_string: format!(
                "sqlite://{}",
                dir.path().join("missing").join("reviews.db").display()
            ),
            database_name: "outdoorsy".to_string(),
            collection_name: "reviews".to_string(),
        });

        let result = AppState::build(&config(store, None, dir.path())).await;
        assert!(matches!(result, Err(AppStateError::Storage(_))));
    }

    #[tokio::test]
    async fn image_strategy_follows_blob_configuration() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(root.path().join(IMAGES_DIR)).expect("images dir");
        fs::write(root.path().join(IMAGES_DIR).join("hero.jpg"), b"jpg").expect("hero");

        let local = AppState::build(&config(StoreConfig::Memory, None, root.path()))
            .await
            .expect("state builds");
        assert_eq!(local.images().kind(), "local");
        assert_eq!(
            local.images().image_url("hero.jpg", &origin()),
            "https://outdoorsy.example/images/hero.jpg"
        );
        assert_eq!(local.images().image_url("missing.jpg", &origin()), "");

        let blob = AppState::build(&config(
            StoreConfig::Memory,
            Some(BlobConfig::new("https://cdn.example.com", "site")),
            root.path(),
        ))
        .await
        .expect("state builds");
        assert_eq!(blob.images().kind(), "blob");
        assert_eq!(
            blob.images().image_url("missing.jpg", &origin()),
            "https://cdn.example.com/site/missing.jpg"
        );

        let half_configured = AppState::build(&config(
            StoreConfig::Memory,
            Some(BlobConfig::new("https://cdn.example.com", "")),
            root.path(),
        ))
        .await
        .expect("state builds");
        assert_eq!(
            half_configured.images().image_url("hero.jpg", &origin()),
            "/images/hero.jpg"
        );
    }
}
