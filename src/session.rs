use crate::{domain::SessionStore, errors::SessionError};
use async_trait::async_trait;
use std::{io::ErrorKind, path::PathBuf};

const SESSION_FILE: &str = "userId";

/// Keeps the session identifier in a file, the local counterpart of a
/// browser's persistent storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn user_id(&self) -> Result<Option<String>, SessionError> {
        match tokio::fs::read_to_string(self.path()).await {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, user_id: &str) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path(), user_id.trim()).await?;
        tracing::info!(user_id = %user_id, "Session stored");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.path()).await {
            Ok(()) => {
                tracing::info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
