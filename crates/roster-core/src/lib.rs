//! roster-core: Shared types and the node schema for the Roster service.
//!
//! This crate provides the foundational types used across all Roster components:
//! - Entity types (User, Character) exposed through the GraphQL API
//! - The closed node schema (labels and their allowed properties)
//! - The `PropertyMap` exchange shape and the entity adapters built on it
//! - Common error types

pub mod entity;
pub mod error;
pub mod schema;
pub mod types;

pub use entity::{GraphEntity, PropertyMap};
pub use error::AdapterError;
pub use schema::NodeLabel;
pub use types::{Character, CliqueType, User, UserType};
