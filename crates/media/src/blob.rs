use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use outdoorsy_util::BlobConfig;

use crate::{is_bare_file_name, local::LocalImages, ImageUrlResolver, RequestOrigin};

/// Reasons a blob URL could not be synthesized for an image.
#[derive(Debug, Error)]
enum BlobUrlError {
    #[error("image name is not a bare file name")]
    InvalidName,
    #[error("invalid container URL: {0}")]
    InvalidBase(#[from] url::ParseError),
}

/// Resolves images to a blob container URL, falling back to the web root.
///
/// The remote object is never checked; a configured container always wins.
#[derive(Debug, Clone)]
pub struct BlobImageResolver {
    blob: BlobConfig,
    local: LocalImages,
}

impl BlobImageResolver {
    pub fn new(blob: BlobConfig, local: LocalImages) -> Self {
        Self { blob, local }
    }

    /// `<base>/<container>/<name>`, verbatim. Only the container URL is parsed,
    /// so the name is never normalized or re-encoded.
    fn blob_url(&self, name: &str) -> Result<String, BlobUrlError> {
        if !is_bare_file_name(name) {
            return Err(BlobUrlError::InvalidName);
        }
        let container_url = self.blob.container_url();
        Url::parse(&container_url)?;
        Ok(format!("{container_url}/{name}"))
    }
}

impl ImageUrlResolver for BlobImageResolver {
    fn image_url(&self, name: &str, _origin: &RequestOrigin) -> String {
        if self.blob.is_configured() {
            match self.blob_url(name) {
                Ok(url) => {
                    info!(stage = "media", %url, "using blob image URL");
                    return url;
                }
                Err(err) => {
                    warn!(stage = "media", image = name, error = %err, "failed to build blob image URL");
                }
            }
        } else {
            info!(
                stage = "media",
                "blob storage not configured, falling back to local files"
            );
        }

        match self.local.relative_url(name) {
            Some(url) => {
                info!(stage = "media", %url, "using local image URL");
                url
            }
            None => {
                warn!(
                    stage = "media",
                    image = name,
                    "image not found in blob storage or locally"
                );
                String::new()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "blob"
    }
}
