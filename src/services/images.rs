// SPDX-License-Identifier: MIT

//! Image file storage for grocery pictures.
//!
//! Files live outside the transactional store, so handlers save the image
//! first and remove it again if the surrounding write fails. References
//! handed out are plain relative filenames; the store never serves paths
//! outside its root.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{AppError, Result};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "jfif"];

/// File-backed image storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store image bytes under a timestamped name derived from the original
    /// filename. Only common image extensions are accepted.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        // Strip any directory components a client may have smuggled in.
        let base = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Validation("Invalid file name".to_string()))?;

        let extension = Path::new(base)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match extension.as_deref() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext) => {}
            _ => {
                return Err(AppError::Validation(
                    "Only image files are allowed".to_string(),
                ))
            }
        }

        let reference = format!("{}_{}", Utc::now().timestamp(), base);
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        tokio::fs::write(self.root.join(&reference), bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        tracing::debug!(reference = %reference, size = bytes.len(), "image stored");
        Ok(reference)
    }

    /// Best-effort removal; a missing file is logged and swallowed so that
    /// entity deletion never fails on filesystem state.
    pub async fn remove(&self, reference: &str) {
        let base = match Path::new(reference).file_name() {
            Some(name) => name,
            None => return,
        };
        if let Err(e) = tokio::fs::remove_file(self.root.join(base)).await {
            tracing::warn!(reference = %reference, error = %e, "failed to remove image");
        }
    }
}
