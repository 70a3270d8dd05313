//! Image URL resolution for pages that embed static images.
//!
//! Two strategies exist: [`BlobImageResolver`] prefers a remote blob container
//! and falls back to files under the web root, [`LocalImageResolver`] only
//! serves files under the web root. Both return an empty string when no image
//! can be found.

pub mod blob;
pub mod local;

use std::path::{Component, Path};

pub use blob::BlobImageResolver;
pub use local::{LocalImageResolver, LocalImages, IMAGES_DIR};

/// Scheme and host of the request an image URL is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// `scheme://host` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_end_matches('/'))
    }
}

/// Produces a servable URL for a named image.
pub trait ImageUrlResolver: Send + Sync {
    /// Returns the URL for `name`, or an empty string when the image is unavailable.
    fn image_url(&self, name: &str, origin: &RequestOrigin) -> String;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

/// Image names must be a single plain path component, for both the blob
/// container and the web root.
pub(crate) fn is_bare_file_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
