use std::path::PathBuf;

use tracing::{debug, warn};

use crate::{is_bare_file_name, ImageUrlResolver, RequestOrigin};

/// Directory under the web root that static images are served from.
pub const IMAGES_DIR: &str = "images";

/// Image files stored under `<web_root>/images`.
#[derive(Debug, Clone)]
pub struct LocalImages {
    web_root: PathBuf,
}

impl LocalImages {
    pub fn new(web_root: impl Into<PathBuf>) -> Self {
        Self {
            web_root: web_root.into(),
        }
    }

    /// Path of the image when it exists as a regular file.
    ///
    /// Only bare file names are looked up; anything with a directory part
    /// resolves to `None`.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        if !is_bare_file_name(name) {
            return None;
        }
        let path = self.web_root.join(IMAGES_DIR).join(name);
        path.is_file().then_some(path)
    }

    /// Root-relative URL (`/images/<name>`) of an existing image.
    pub fn relative_url(&self, name: &str) -> Option<String> {
        self.find(name).map(|_| format!("/{IMAGES_DIR}/{name}"))
    }
}

/// Serves images from the web root only, as absolute URLs on the requesting host.
#[derive(Debug, Clone)]
pub struct LocalImageResolver {
    images: LocalImages,
}

impl LocalImageResolver {
    pub fn new(images: LocalImages) -> Self {
        Self { images }
    }
}

impl ImageUrlResolver for LocalImageResolver {
    fn image_url(&self, name: &str, origin: &RequestOrigin) -> String {
        match self.images.find(name) {
            Some(_) => {
                let url = format!("{}/{IMAGES_DIR}/{name}", origin.base_url());
                debug!(stage = "media", %url, "using local image URL");
                url
            }
            None => {
                warn!(stage = "media", image = name, "image not found locally");
                String::new()
            }
        }
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
