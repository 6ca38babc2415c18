//! Session persistence.
//!
//! Every backend implements [`SessionStore`]. [`SessionCoordinator`] wraps an
//! ordered list of backends behind the same trait: writes go to all of them,
//! reads come from the first one.

pub mod coordinator;
pub mod file;
pub mod surreal;

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Session;

pub use coordinator::SessionCoordinator;
pub use file::FileStore;
pub use surreal::SurrealStore;

/// All stored sessions keyed by session id.
pub type SessionMap = HashMap<String, Session>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt session record {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Invalid session id: {0}")]
    InvalidId(String),

    #[error("No storage backend is enabled")]
    NoBackends,

    #[error("All storage backends failed to {operation}: {}", .failures.join("; "))]
    AllBackendsFailed {
        operation: &'static str,
        failures: Vec<String>,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result of a delete. A missing record is reported as `success: false`
/// rather than as an error.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeleteOutcome {
    pub success: bool,
}

impl DeleteOutcome {
    pub const DELETED: Self = Self { success: true };
    pub const NOT_FOUND: Self = Self { success: false };
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Creates or fully overwrites the session stored under `session.id`.
    async fn save(&self, session: &Session) -> Result<Session, StoreError>;

    async fn get_all(&self) -> Result<SessionMap, StoreError>;

    async fn get_one(&self, id: &str) -> Result<Option<Session>, StoreError>;

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError>;
}
