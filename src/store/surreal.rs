use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{engine::any::Any, Surreal};
use tokio::sync::OnceCell;

use super::{DeleteOutcome, SessionMap, SessionStore, StoreError};
use crate::{
    config::DatabaseConfig,
    db::{establish_connection, SESSION_TABLE},
    models::{CustomPlot, ExtraFields, Run, Session},
};

/// Stores sessions as documents in the `session` table, keyed by session id.
///
/// The connection is opened on first use and then reused. A failed connect
/// is not cached, so the next operation tries again.
pub struct SurrealStore {
    config: DatabaseConfig,
    db: OnceCell<Surreal<Any>>,
}

/// Document shape in the `session` table. The session id lives in
/// `session_id` because `id` is the database's own record id; reads omit
/// that record id so it never leaks into `extra`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
struct SessionDocument {
    session_id: String,
    name: String,

    #[serde(default)]
    runs: Vec<Run>,
    #[serde(default)]
    custom_plots: Vec<CustomPlot>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    #[serde(flatten)]
    extra: ExtraFields,
}

impl From<&Session> for SessionDocument {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            name: session.name.clone(),
            runs: session.runs.clone(),
            custom_plots: session.custom_plots.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            extra: session.extra.clone(),
        }
    }
}

impl From<SessionDocument> for Session {
    fn from(stored: SessionDocument) -> Self {
        Self {
            id: stored.session_id,
            name: stored.name,
            runs: stored.runs,
            custom_plots: stored.custom_plots,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            extra: stored.extra,
        }
    }
}

impl SurrealStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    async fn db(&self) -> Result<&Surreal<Any>, StoreError> {
        let db = self
            .db
            .get_or_try_init(|| establish_connection(&self.config))
            .await?;
        Ok(db)
    }
}

#[async_trait]
impl SessionStore for SurrealStore {
    fn name(&self) -> &'static str {
        "surrealdb"
    }

    async fn save(&self, session: &Session) -> Result<Session, StoreError> {
        self.db()
            .await?
            .query("UPSERT type::thing($table, $id) CONTENT $document RETURN NONE")
            .bind(("table", SESSION_TABLE))
            .bind(("id", session.id.clone()))
            .bind(("document", SessionDocument::from(session)))
            .await?
            .check()?;

        Ok(session.clone())
    }

    async fn get_all(&self) -> Result<SessionMap, StoreError> {
        let mut results = self
            .db()
            .await?
            .query("SELECT * OMIT id FROM type::table($table)")
            .bind(("table", SESSION_TABLE))
            .await?;
        let stored: Vec<SessionDocument> = results.take(0)?;

        Ok(stored
            .into_iter()
            .map(Session::from)
            .map(|session| (session.id.clone(), session))
            .collect())
    }

    async fn get_one(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let mut results = self
            .db()
            .await?
            .query("SELECT * OMIT id FROM type::thing($table, $id)")
            .bind(("table", SESSION_TABLE))
            .bind(("id", id.to_owned()))
            .await?;
        let stored: Option<SessionDocument> = results.take(0)?;

        Ok(stored.map(Session::from))
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        if self.get_one(id).await?.is_none() {
            return Ok(DeleteOutcome::NOT_FOUND);
        }

        self.db()
            .await?
            .query("DELETE type::thing($table, $id)")
            .bind(("table", SESSION_TABLE))
            .bind(("id", id.to_owned()))
            .await?
            .check()?;

        Ok(DeleteOutcome::DELETED)
    }
}
