//! Directory-backed storage for uploaded avatar images.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::constants::{AVATAR_EXTENSIONS, MAX_AVATAR_BYTES};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AvatarStorage {
    dir: PathBuf,
}

impl AvatarStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode a base64 image and store it under a fresh `avatar_<uuid>.<ext>` name
    ///
    /// The extension is taken from `original_name` and must be a known image
    /// type. Returns the stored file name.
    pub async fn save_base64(&self, data: &str, original_name: &str) -> Result<String> {
        let extension = image_extension(original_name)?;

        // Tolerate data URLs ("data:image/png;base64,....")
        let payload = data.split_once(',').map_or(data, |(_, rest)| rest).trim();
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| AppError::Validation(format!("Invalid avatar data: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Avatar data is empty".to_string()));
        }

        if bytes.len() > MAX_AVATAR_BYTES {
            tracing::warn!(
                "Avatar upload too large: {} bytes (max: {})",
                bytes.len(),
                MAX_AVATAR_BYTES
            );
            return Err(AppError::Validation(
                "Avatar may not be larger than 2MB".to_string(),
            ));
        }

        let file_name = format!("avatar_{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), &bytes).await?;

        tracing::info!("Stored avatar {} ({} bytes)", file_name, bytes.len());
        Ok(file_name)
    }

    /// Read a stored avatar and its content type
    pub async fn load(&self, file_name: &str) -> Result<(Vec<u8>, &'static str)> {
        if !is_safe_file_name(file_name) {
            tracing::warn!("Rejected avatar file name: {:?}", file_name);
            return Err(AppError::AvatarNotFound);
        }

        let bytes = match tokio::fs::read(self.dir.join(file_name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::AvatarNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        Ok((bytes, content_type(file_name)))
    }

    /// Delete a stored avatar; a missing file is not an error
    pub async fn remove(&self, file_name: &str) -> Result<()> {
        if !is_safe_file_name(file_name) {
            return Err(AppError::AvatarNotFound);
        }

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                tracing::info!("Removed avatar {}", file_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Lower-cased image extension of a client-supplied file name
fn image_extension(original_name: &str) -> Result<String> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if AVATAR_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::Validation(
            "Avatar must be a png, jpg, jpeg, gif or webp image".to_string(),
        ))
    }
}

/// Plain file names only: no separators, no parent references
fn is_safe_file_name(file_name: &str) -> bool {
    !file_name.is_empty()
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn content_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
