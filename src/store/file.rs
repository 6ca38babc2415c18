use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::{DeleteOutcome, SessionMap, SessionStore, StoreError};
use crate::models::{session::validate_session_id, Session};

const EXTENSION: &str = "json";

/// Stores every session as `<dir>/<id>.json`.
///
/// The directory is created on first use. Listing skips records that fail to
/// parse so one bad file cannot hide the others.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_session_id(id).map_err(StoreError::InvalidId)?;
        Ok(self.dir.join(format!("{id}.{EXTENSION}")))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))
    }

    async fn read_session(path: &Path) -> Result<Session, StoreError> {
        let raw = fs::read(path).await.map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SessionStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn save(&self, session: &Session) -> Result<Session, StoreError> {
        let path = self.path_for(&session.id)?;
        self.ensure_dir().await?;

        let body = serde_json::to_vec_pretty(session)?;

        // Write next to the target and rename so readers never see half a file.
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, &body)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        debug!(id = %session.id, path = %path.display(), "saved session file");
        Ok(session.clone())
    }

    async fn get_all(&self) -> Result<SessionMap, StoreError> {
        self.ensure_dir().await?;

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let mut sessions = SessionMap::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }

            match Self::read_session(&path).await {
                Ok(session) => {
                    sessions.insert(session.id.clone(), session);
                }
                Err(e) => warn!("skipping unreadable session file: {e}"),
            }
        }

        Ok(sessions)
    }

    async fn get_one(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let path = self.path_for(id)?;
        match Self::read_session(&path).await {
            Ok(session) => Ok(Some(session)),
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(DeleteOutcome::DELETED),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteOutcome::NOT_FOUND),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}
