//! Error types for the roster-api crate.

use roster_core::AdapterError;
use roster_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{label} not found: {id}")]
    NotFound { label: &'static str, id: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Stored record is invalid: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
