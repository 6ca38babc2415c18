use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use itertools::Itertools;
use tracing::{error, info, warn};

use super::{
    DeleteOutcome, FileStore, SessionMap, SessionStore, StoreError, SurrealStore,
};
use crate::{config::StorageConfig, models::Session};

/// Fans writes out to every enabled backend and reads from the first one.
///
/// A write succeeds when at least one backend accepted it. Backends that
/// failed are only logged; nothing is retried or reconciled later.
pub struct SessionCoordinator {
    backends: Vec<Arc<dyn SessionStore>>,
}

impl SessionCoordinator {
    /// `backends` are in priority order; the first one serves all reads.
    pub fn new(backends: Vec<Arc<dyn SessionStore>>) -> Result<Self, StoreError> {
        if backends.is_empty() {
            return Err(StoreError::NoBackends);
        }
        Ok(Self { backends })
    }

    /// Builds the backends enabled in `config`. The file backend, when
    /// enabled, comes first and is therefore the primary.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StoreError> {
        let mut backends: Vec<Arc<dyn SessionStore>> = vec![];

        if config.file_storage {
            info!(dir = %config.sessions_dir.display(), "file storage enabled");
            backends.push(Arc::new(FileStore::new(&config.sessions_dir)));
        }
        if config.database_storage {
            info!(url = %config.database.url, "database storage enabled");
            backends.push(Arc::new(SurrealStore::new(config.database.clone())));
        }

        Self::new(backends)
    }

    pub fn primary(&self) -> &dyn SessionStore {
        self.backends[0].as_ref()
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Collects per-backend errors, logging each one.
    fn log_failures<T>(
        &self,
        operation: &'static str,
        results: &[Result<T, StoreError>],
    ) -> Vec<String> {
        self.backends
            .iter()
            .zip(results)
            .filter_map(|(backend, result)| match result {
                Err(e) => {
                    warn!(backend = backend.name(), "{operation} failed: {e}");
                    Some(format!("{}: {e}", backend.name()))
                }
                Ok(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl SessionStore for SessionCoordinator {
    fn name(&self) -> &'static str {
        "coordinator"
    }

    async fn save(&self, session: &Session) -> Result<Session, StoreError> {
        let results = join_all(self.backends.iter().map(|backend| backend.save(session))).await;
        let failures = self.log_failures("save", &results);

        match results.into_iter().find_map(Result::ok) {
            Some(saved) => Ok(saved),
            None => {
                error!(
                    id = %session.id,
                    "no backend accepted the session: {}",
                    failures.iter().join("; ")
                );
                Err(StoreError::AllBackendsFailed {
                    operation: "save",
                    failures,
                })
            }
        }
    }

    async fn get_all(&self) -> Result<SessionMap, StoreError> {
        self.primary().get_all().await
    }

    async fn get_one(&self, id: &str) -> Result<Option<Session>, StoreError> {
        self.primary().get_one(id).await
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let results = join_all(self.backends.iter().map(|backend| backend.delete(id))).await;
        let failures = self.log_failures("delete", &results);

        let outcomes: Vec<DeleteOutcome> = results.into_iter().filter_map(Result::ok).collect();
        if outcomes.is_empty() {
            error!(id, "no backend could delete the session: {}", failures.iter().join("; "));
            return Err(StoreError::AllBackendsFailed {
                operation: "delete",
                failures,
            });
        }

        Ok(if outcomes.iter().any(|outcome| outcome.success) {
            DeleteOutcome::DELETED
        } else {
            DeleteOutcome::NOT_FOUND
        })
    }
}
