//! Entity identifiers.
//!
//! Ids are opaque strings owned by the backing store. Ids generated locally
//! are random UUIDs encoded with base58, which keeps them short and safe to
//! use in URLs and file names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing an entity id
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("Entity id cannot be empty")]
    Empty,

    #[error("Invalid entity id '{0}': ids cannot contain '/' or whitespace")]
    InvalidCharacter(String),
}

/// Opaque identifier of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new random id
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Encode a UUID as a base58 id
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(bs58::encode(uuid.as_bytes()).into_string())
    }

    /// Validate and wrap an id issued by a backing store
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.contains('/') || s.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidCharacter(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
