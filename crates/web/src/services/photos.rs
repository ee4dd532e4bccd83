//! Store photo uploads.
//!
//! Accepts image uploads, resizes anything wider than 800px down to 800px
//! (aspect preserved), and writes the result under a UUID filename in the
//! upload directory.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use thiserror::Error;
use uuid::Uuid;

/// Maximum stored photo width in pixels.
const MAX_WIDTH: u32 = 800;

/// Content types accepted for upload, with their stored extension.
const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
];

/// Errors that can occur while storing a photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Upload is not an accepted image type.
    #[error("that filetype isn't allowed: {0}")]
    UnsupportedType(String),

    /// Uploaded bytes are not a decodable image.
    #[error("could not read image: {0}")]
    Decode(image::ImageError),

    /// Writing the resized image failed.
    #[error("could not store image: {0}")]
    Io(String),
}

/// Service for storing uploaded store photos.
#[derive(Debug, Clone)]
pub struct PhotoService {
    upload_dir: PathBuf,
}

impl PhotoService {
    /// Create a photo service writing into `upload_dir`.
    #[must_use]
    pub const fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    /// The directory uploaded photos are served from.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate, resize, and store an uploaded photo.
    ///
    /// Returns the stored filename (UUID plus extension).
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError::UnsupportedType`] for non-image uploads,
    /// [`PhotoError::Decode`] for undecodable bytes, [`PhotoError::Io`] if
    /// the file cannot be written.
    pub async fn store_photo(
        &self,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, PhotoError> {
        let extension = ACCEPTED_TYPES
            .iter()
            .find(|(ct, _)| content_type.eq_ignore_ascii_case(ct))
            .map(|(_, ext)| *ext)
            .ok_or_else(|| PhotoError::UnsupportedType(content_type.to_owned()))?;

        let img = image::load_from_memory(bytes).map_err(PhotoError::Decode)?;

        // Shrink wide uploads; never enlarge
        let img = if img.width() > MAX_WIDTH {
            let height = scaled_height(img.width(), img.height());
            img.resize_exact(MAX_WIDTH, height, FilterType::Triangle)
        } else {
            img
        };

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| PhotoError::Io(e.to_string()))?;

        let filename = format!("{}.{extension}", Uuid::new_v4());
        let path = self.upload_dir.join(&filename);
        img.save(&path).map_err(|e| PhotoError::Io(e.to_string()))?;

        tracing::info!(filename = %filename, "Stored uploaded photo");
        Ok(filename)
    }
}

/// Height after scaling `width` down to [`MAX_WIDTH`], aspect preserved.
#[allow(clippy::cast_possible_truncation)]
fn scaled_height(width: u32, height: u32) -> u32 {
    let scaled = u64::from(height) * u64::from(MAX_WIDTH) / u64::from(width.max(1));
    (scaled.max(1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_height_preserves_aspect() {
        assert_eq!(scaled_height(1600, 1200), 600);
        assert_eq!(scaled_height(800, 800), 800);
        assert_eq!(scaled_height(2400, 800), 266);
    }

    #[test]
    fn test_scaled_height_never_zero() {
        assert_eq!(scaled_height(10_000, 1), 1);
    }

    #[test]
    fn test_accepted_types() {
        assert!(ACCEPTED_TYPES.iter().any(|(ct, _)| *ct == "image/png"));
        assert!(!ACCEPTED_TYPES.iter().any(|(ct, _)| *ct == "text/html"));
    }
}
