//! Neo4j connection management and the neo4rs-backed graph store.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Row, Txn};

use crate::record::{RawRecord, Value};
use crate::session::{AccessMode, GraphStore, StoreSession};
use crate::statement::{Projection, Statement};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Write on {label} with {key} = {value} returned no record")]
    NoResultProduced {
        label: String,
        key: String,
        value: String,
    },

    #[error("Node not found: {label} with {key} = {value}")]
    NotFound {
        label: String,
        key: String,
        value: String,
    },

    #[error("Expected one {label} with {key} = {value}, found {count}")]
    AmbiguousResult {
        label: String,
        key: String,
        value: String,
        count: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl GraphError {
    /// True for connection and driver level failures.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query(_))
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
    /// Extra attempts made when a transaction cannot be started.
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: None,
            max_connections: 16,
            fetch_size: 256,
            max_retries: 3,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Owned by the application and handed to whatever needs the store.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self {
            graph,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: config.retry_backoff,
            },
        })
    }

    /// Run a trivial statement to prove the server is reachable.
    pub async fn verify_connectivity(&self) -> Result<(), GraphError> {
        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn open_session(&self, mode: AccessMode) -> Result<Box<dyn StoreSession>, GraphError> {
        Ok(Box::new(Neo4jSession {
            graph: self.graph.clone(),
            mode,
            retry: self.retry,
            txn: None,
        }))
    }
}

/// A session over the pooled driver. Each `run` borrows one connection for
/// the lifetime of one explicit transaction.
///
/// The open transaction lives in the session rather than in the `run`
/// future, so a run dropped by a fired `CallContext` leaves it behind for
/// `close` to roll back.
struct Neo4jSession {
    graph: Graph,
    mode: AccessMode,
    retry: RetryPolicy,
    txn: Option<Txn>,
}

impl Neo4jSession {
    async fn begin(&self) -> Result<Txn, GraphError> {
        let mut attempt = 0;
        loop {
            match self.graph.start_txn().await {
                Ok(txn) => return Ok(txn),
                Err(e) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "Failed to begin transaction, retrying");
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                Err(e) => return Err(GraphError::Connection(e.to_string())),
            }
        }
    }

    /// Roll back and drop whatever transaction is still open.
    async fn abandon(&mut self) -> Result<(), GraphError> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await.map_err(GraphError::from),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreSession for Neo4jSession {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<RawRecord>, GraphError> {
        self.abandon().await?;
        let txn = self.begin().await?;
        let txn = self.txn.insert(txn);
        let outcome = collect(txn, statement).await;

        let Some(txn) = self.txn.take() else {
            return outcome;
        };
        match (outcome, self.mode) {
            (Ok(records), AccessMode::Write) => {
                txn.commit().await?;
                Ok(records)
            }
            (Ok(records), AccessMode::Read) => {
                // Read transactions never persist anything.
                if let Err(e) = txn.rollback().await {
                    tracing::warn!(error = %e, "Failed to close read transaction");
                }
                Ok(records)
            }
            (Err(err), _) => {
                if let Err(e) = txn.rollback().await {
                    tracing::warn!(error = %e, "Rollback after failed statement failed");
                }
                Err(err)
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), GraphError> {
        let mut session = *self;
        if session.txn.is_some() {
            tracing::debug!(mode = ?session.mode, "Rolling back interrupted transaction");
        }
        // A failed rollback leaves the connection unusable; the pool's RESET
        // on its next checkout fails and the connection is discarded, which
        // ends the transaction server-side.
        session.abandon().await
    }
}

async fn collect(txn: &mut Txn, statement: &Statement) -> Result<Vec<RawRecord>, GraphError> {
    let mut stream = txn.execute(to_query(statement)).await?;
    let mut records = Vec::new();
    while let Some(row) = stream.next(txn.handle()).await? {
        records.push(decode_row(&row, &statement.projection)?);
    }
    Ok(records)
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(query(&statement.text), |q, (name, value)| {
            q.param(name, value.clone())
        })
}

fn decode_row(row: &Row, projection: &Projection) -> Result<RawRecord, GraphError> {
    match projection {
        Projection::Columns(columns) => {
            let mut values = Vec::with_capacity(columns.len());
            for column in columns {
                let value: Value = row.get(column).map_err(|e| {
                    GraphError::Serialization(format!("Failed to read column {column}: {e}"))
                })?;
                values.push(value);
            }
            Ok(RawRecord::Row {
                columns: columns.clone(),
                values,
            })
        }
        Projection::Node(variable) => {
            let node: neo4rs::Node = row.get(variable).map_err(|e| {
                GraphError::Serialization(format!("Failed to deserialize node: {e}"))
            })?;
            let mut properties = BTreeMap::new();
            for key in node.keys() {
                let value: Value = node.get(key).map_err(|e| {
                    GraphError::Serialization(format!("Failed to read property {key}: {e}"))
                })?;
                properties.insert(key.to_string(), value);
            }
            Ok(RawRecord::Node { properties })
        }
    }
}
