//! Configuration for the roster-api service.

use std::time::Duration;

use roster_graph::GraphConfig;
use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Top-level service configuration.
///
/// Loaded from `roster.toml` or `ROSTER__` environment variables. The
/// plain `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` and `PORT` variables
/// override both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub neo4j: Neo4jConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline applied to every graph call made while serving a request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Serve the GraphQL playground at `/`.
    #[serde(default = "default_true")]
    pub playground: bool,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jConfig {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Neo4jConfig {
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            uri: self.uri.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            max_connections: self.max_connections,
            fetch_size: self.fetch_size,
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Load configuration from `<file_prefix>.toml` (optional) and the environment.
pub fn load_config(file_prefix: &str) -> Result<ApiConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("ROSTER")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("neo4j.uri", std::env::var("NEO4J_URI").ok())
        .and_then(|b| b.set_override_option("neo4j.user", std::env::var("NEO4J_USER").ok()))
        .and_then(|b| {
            b.set_override_option("neo4j.password", std::env::var("NEO4J_PASSWORD").ok())
        })
        .and_then(|b| b.set_override_option("server.port", std::env::var("PORT").ok()))
        .and_then(|b| b.build())
        .map_err(|e| ApiError::Config(e.to_string()))?;

    cfg.try_deserialize()
        .map_err(|e| ApiError::Config(e.to_string()))
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            playground: default_true(),
        }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: None,
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}
