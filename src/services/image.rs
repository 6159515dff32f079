//! Image storage
//!
//! Recipe images and avatars arrive inline as base64 data URIs
//! (`data:image/png;base64,...`). The store decodes them onto disk under the
//! media root and hands back the public `/media/...` path that gets persisted
//! with the record. Values that are not data URIs (an already-stored path on
//! update) pass through unchanged.

use anyhow::{Context, Result};
use data_encoding::BASE64;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Errors surfaced to callers when an inline image cannot be accepted
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The base64 payload could not be decoded
    #[error("Invalid base64 image payload")]
    InvalidPayload,

    /// The decoded image exceeds the configured size cap
    #[error("Image exceeds maximum size of {0} bytes")]
    TooLarge(usize),

    /// Filesystem failure while persisting the image
    #[error("Failed to store image")]
    Storage(#[from] anyhow::Error),
}

/// Filesystem-backed image store rooted at the configured media directory
pub struct ImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Store an image value for the given subdirectory (`recipes`, `avatars`).
    ///
    /// A data URI is decoded and written under a fresh random filename; any
    /// other value is returned as-is.
    pub fn store_inline(&self, value: &str, subdir: &str) -> Result<String, ImageError> {
        let Some((extension, bytes)) = parse_data_uri(value) else {
            return Ok(value.to_string());
        };

        if bytes.len() > self.max_bytes {
            return Err(ImageError::TooLarge(self.max_bytes));
        }

        let dir = self.root.join(subdir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create media directory {}", dir.display()))?;

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = dir.join(&filename);
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write image {}", path.display()))?;

        Ok(format!("/media/{}/{}", subdir, filename))
    }

    /// Remove a previously stored image by its public `/media/...` path.
    /// Missing files and non-media paths are ignored.
    pub fn remove(&self, public_path: &str) {
        let Some(relative) = public_path.strip_prefix("/media/") else {
            return;
        };
        // Stored filenames are generated; refuse anything that walks upward
        if Path::new(relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return;
        }
        let _ = std::fs::remove_file(self.root.join(relative));
    }
}

/// Split a `data:image/<ext>;base64,<payload>` URI into its extension and
/// decoded bytes. Returns None for anything that is not such a URI.
pub fn parse_data_uri(value: &str) -> Option<(String, Vec<u8>)> {
    let rest = value.strip_prefix("data:image/")?;
    let (extension, payload) = rest.split_once(";base64,")?;
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let bytes = BASE64.decode(payload.as_bytes()).ok()?;
    Some((extension.to_string(), bytes))
}
