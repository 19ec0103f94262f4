//! Hosted image storage. Only the returned secure URL is ever persisted.

pub mod cloudinary;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;

pub use cloudinary::CloudinaryClient;

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Image host is not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("Cannot derive an image id from {0}")]
    InvalidUrl(String),
}

/// A validated image ready to be forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub folder: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store the image and return its public https URL.
    async fn upload(&self, image: ImageUpload) -> Result<String, CdnError>;

    async fn delete(&self, url: &str) -> Result<(), CdnError>;
}

/// Host-side id for a stored URL: the last two path segments (folder and
/// file) with everything from the first `.` dropped.
///
/// `https://res.cloudinary.com/demo/image/upload/v1/productos/abc.jpg` → `productos/abc`
pub fn public_id_from_url(image_url: &str) -> Option<String> {
    let parsed = url::Url::parse(image_url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }
    let tail = segments[segments.len().saturating_sub(2)..].join("/");
    let id = tail.split('.').next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Delete every URL concurrently. Failures are logged and otherwise ignored.
pub async fn delete_images_best_effort(host: &dyn ImageHost, urls: &[String]) {
    if urls.is_empty() {
        return;
    }
    let results = join_all(urls.iter().map(|url| host.delete(url))).await;
    for (url, result) in urls.iter().zip(results) {
        if let Err(e) = result {
            tracing::warn!(url = %url, "Failed to delete image: {}", e);
        }
    }
}
