use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use byte_unit::Byte;

use crate::helpers::{parse_flag, read_env_var};

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    /// Limit for every request body, uploads and session saves alike, in bytes.
    pub max_upload_size: u64,
}

/// Which session backends are enabled. Fixed for the lifetime of a
/// coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    pub file_storage: bool,
    pub sessions_dir: PathBuf,

    pub database_storage: bool,
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    /// Any endpoint the SurrealDB `any` engine accepts, e.g. `ws://host:8000`
    /// or `mem://`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 3001,
            max_upload_size: 50_000_000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_storage: true,
            sessions_dir: PathBuf::from("data/sessions"),
            database_storage: false,
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "benchdash".into(),
            database: "sessions".into(),
            username: None,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Root credentials, only when both user and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

impl Config {
    /// Loads `.env` if present and reads the configuration from the process
    /// environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(read_env_var)
    }

    /// Builds the configuration from `lookup`, falling back to defaults for
    /// keys it does not know.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let flag = |key: &str, default: bool| -> Result<bool> {
            match lookup(key) {
                Some(value) => parse_flag(&value)
                    .ok_or_else(|| anyhow!("{key} must be a boolean flag, got '{value}'")),
                None => Ok(default),
            }
        };

        let server_defaults = ServerConfig::default();
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?,
            None => server_defaults.port,
        };
        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(size) => Byte::parse_str(&size, true)
                .map_err(|e| anyhow!("MAX_UPLOAD_SIZE '{size}' is not a byte size: {e}"))?
                .as_u64(),
            None => server_defaults.max_upload_size,
        };

        let storage_defaults = StorageConfig::default();
        let database_defaults = storage_defaults.database.clone();

        Ok(Self {
            server: ServerConfig {
                address: lookup("ADDRESS").unwrap_or(server_defaults.address),
                port,
                max_upload_size,
            },
            storage: StorageConfig {
                file_storage: flag("USE_FILE_STORAGE", storage_defaults.file_storage)?,
                sessions_dir: lookup("SESSIONS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(storage_defaults.sessions_dir),
                database_storage: flag("USE_DATABASE_STORAGE", storage_defaults.database_storage)?,
                database: DatabaseConfig {
                    url: lookup("DATABASE_URL").unwrap_or(database_defaults.url),
                    namespace: lookup("DATABASE_NAMESPACE").unwrap_or(database_defaults.namespace),
                    database: lookup("DATABASE_NAME").unwrap_or(database_defaults.database),
                    username: lookup("DATABASE_USER"),
                    password: lookup("DATABASE_PASS"),
                },
            },
        })
    }
}
