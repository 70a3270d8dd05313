//! Review domain: the review entity, the storage capability it is persisted
//! through, and the service enforcing one review per email.

pub mod outcome;
pub mod repository;
pub mod review;
pub mod service;

pub use outcome::OperationResult;
pub use repository::ReviewRepository;
pub use review::{email_key, Field, Review, ValidationError, ValidationErrors};
pub use service::ReviewService;
