use surrealdb::{
    engine::any::{self, Any},
    opt::auth::Root,
    Surreal,
};
use tracing::info;

use crate::config::DatabaseConfig;

pub const SESSION_TABLE: &str = "session";

/// Connects to SurrealDB, selects the configured namespace/database and makes
/// sure the unique index on `session_id` exists.
pub async fn establish_connection(config: &DatabaseConfig) -> surrealdb::Result<Surreal<Any>> {
    let db = any::connect(config.url.as_str()).await?;

    if let Some((username, password)) = config.credentials() {
        db.signin(Root { username, password }).await?;
    }

    db.use_ns(config.namespace.as_str())
        .use_db(config.database.as_str())
        .await?;

    db.query(format!(
        "DEFINE INDEX IF NOT EXISTS {SESSION_TABLE}_id_unique \
         ON TABLE {SESSION_TABLE} FIELDS session_id UNIQUE"
    ))
    .await?
    .check()?;

    info!(
        url = %config.url,
        namespace = %config.namespace,
        database = %config.database,
        "connected to SurrealDB"
    );
    Ok(db)
}
