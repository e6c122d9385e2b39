//! Core domain types served by the Roster API.
//!
//! Users are persisted as `User` nodes in the graph; characters live in an
//! in-memory store but share the same property-map representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Users ─────────────────────────────────────────────────────────

/// A person registered with the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub user_type: UserType,
}

impl User {
    /// Create a user with a freshly generated v4 UUID.
    pub fn new(name: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            user_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Student,
    Teacher,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "TEACHER" => Ok(Self::Teacher),
            other => Err(other.to_string()),
        }
    }
}

// ── Characters ────────────────────────────────────────────────────

/// A fictional character belonging to a clique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub is_hero: bool,
    pub clique_type: CliqueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CliqueType {
    Kooks,
    Jocks,
    Nerds,
}

impl CliqueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kooks => "KOOKS",
            Self::Jocks => "JOCKS",
            Self::Nerds => "NERDS",
        }
    }
}

impl fmt::Display for CliqueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CliqueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KOOKS" => Ok(Self::Kooks),
            "JOCKS" => Ok(Self::Jocks),
            "NERDS" => Ok(Self::Nerds),
            other => Err(other.to_string()),
        }
    }
}
