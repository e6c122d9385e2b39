//! roster-graph: generic node queries and mutations over Neo4j.
//!
//! Typed records travel as property maps. This crate compiles node
//! searches and upserts into parameterized Cypher, runs each one in a
//! scoped session and transaction, and maps the records back.

pub mod client;
pub mod context;
pub mod mutations;
pub mod queries;
pub mod record;
pub mod session;
pub mod statement;
pub mod store;

#[cfg(test)]
mod test_support;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use context::{CallContext, Canceller};
pub use session::{AccessMode, GraphStore, SessionExecutor, StoreSession};
pub use statement::{MultiSearchSpec, SearchSpec};
pub use store::NodeStore;
