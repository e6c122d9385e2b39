//! The fixed graph schema.
//!
//! Labels and property names are spliced into statement text, so they may
//! only come from this module. Values never are; they are always bound as
//! statement parameters.

use serde::{Deserialize, Serialize};

/// Node labels known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    User,
    Character,
}

const USER_PROPERTIES: &[&str] = &["uuid", "name", "userType"];
const CHARACTER_PROPERTIES: &[&str] = &["id", "name", "isHero", "cliqueType"];

impl NodeLabel {
    #[cfg(test)]
    pub const ALL: [NodeLabel; 2] = [NodeLabel::User, NodeLabel::Character];

    /// The label as written in statement text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Character => "Character",
        }
    }

    /// Property that uniquely identifies a node of this label.
    pub fn key_property(&self) -> &'static str {
        match self {
            Self::User => "uuid",
            Self::Character => "id",
        }
    }

    /// Every property a node of this label may carry.
    pub fn properties(&self) -> &'static [&'static str] {
        match self {
            Self::User => USER_PROPERTIES,
            Self::Character => CHARACTER_PROPERTIES,
        }
    }

    /// Resolve a caller-supplied name to the schema's static identifier.
    pub fn property(&self, name: &str) -> Option<&'static str> {
        self.properties().iter().copied().find(|p| *p == name)
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `name` is a plain identifier: an ASCII letter followed by
/// ASCII letters, digits, or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
