//! roster-api: GraphQL service over the Roster node store.
//!
//! Users are persisted in Neo4j through `roster-graph`; characters are kept
//! in process. Both sit behind the same `Repository` capability, which is
//! all the GraphQL layer depends on.

pub mod config;
pub mod error;
pub mod repository;
pub mod schema;
pub mod server;
