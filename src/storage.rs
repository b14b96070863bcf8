use crate::errors::StorageError;
use anyhow::Context;
use std::{io::ErrorKind, path::PathBuf};

/// The local fallback image set, read from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalAssets {
    root: PathBuf,
}

impl LocalAssets {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reads a file and guesses its content type from the name. Keys that
    /// would leave the root directory are reported as not found.
    pub async fn download(&self, key: &str) -> Result<(Vec<u8>, String), StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            tracing::warn!(asset_key = %key, "Rejected asset key");
            return Err(StorageError::NotFound(key.to_string()));
        }

        let path = self.root.join(key);
        tracing::debug!(path = %path.display(), "Reading local asset");

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(asset_key = %key, "Local asset not found");
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::BackendError(
                    anyhow::Error::new(e).context(format!("Failed to read asset '{}'", path.display())),
                ));
            }
        };

        let content_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();
        Ok((data, content_type))
    }

    /// Whether the configured directory exists at all.
    pub async fn check(&self) -> anyhow::Result<()> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .with_context(|| format!("Fallback image directory '{}' is not readable", self.root.display()))?;
        anyhow::ensure!(meta.is_dir(), "'{}' is not a directory", self.root.display());
        Ok(())
    }
}
