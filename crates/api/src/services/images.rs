//! Recipe image storage on the local filesystem.
//!
//! Uploads are checked by decoding them, then written to
//! `<media root>/uploads/recipe/<uuid>.<ext>` and served under `/media`.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;
use uuid::Uuid;

/// URL prefix the media root is served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// Directory (relative to the media root) holding recipe images.
const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Formats accepted for upload.
const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Errors that can occur while storing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// No file, or an empty one, was submitted.
    #[error("no image submitted")]
    Missing,

    /// The payload is not a decodable image in an accepted format.
    #[error("invalid image: {0}")]
    Invalid(String),

    /// Writing to the media root failed.
    #[error("image storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoding task did not complete.
    #[error("image task failed: {0}")]
    Task(String),
}

/// Filesystem-backed image store rooted at the media directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store writing below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The media root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and store an uploaded image.
    ///
    /// # Returns
    ///
    /// The stored file's path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Missing` for an empty payload,
    /// `ImageError::Invalid` if it doesn't decode as an accepted format, and
    /// `ImageError::Io` if the file can't be written.
    pub async fn save(&self, data: Vec<u8>) -> Result<String, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Missing);
        }

        let (format, data) = tokio::task::spawn_blocking(move || {
            validate_image(&data).map(|format| (format, data))
        })
        .await
        .map_err(|e| ImageError::Task(e.to_string()))??;

        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("{RECIPE_UPLOAD_DIR}/{}.{extension}", Uuid::new_v4());
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %relative, bytes = data.len(), "image stored");
        Ok(relative)
    }

    /// Remove a previously stored image. Missing files are ignored.
    pub async fn remove(&self, relative: &str) {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::debug!(path = %relative, "image removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "failed to remove image"),
        }
    }
}

/// Public URL path for a stored image.
#[must_use]
pub fn public_url(relative: &str) -> String {
    format!("{MEDIA_URL_PREFIX}/{relative}")
}

/// Decode the payload fully and return its format.
fn validate_image(data: &[u8]) -> Result<ImageFormat, ImageError> {
    let format = image::guess_format(data).map_err(|e| ImageError::Invalid(e.to_string()))?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(ImageError::Invalid(format!("unsupported format {format:?}")));
    }

    image::load_from_memory_with_format(data, format)
        .map_err(|e| ImageError::Invalid(e.to_string()))?;
    Ok(format)
}
