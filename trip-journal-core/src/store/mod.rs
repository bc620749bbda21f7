//! Document store contract.
//!
//! The entity layer talks to persistence only through [`DocumentStore`]: a
//! schemaless, collection-oriented store with no cross-document transactions,
//! no foreign keys and last-write-wins semantics.
//!
//! # Persisted shape
//!
//! A document is a flat JSON object keyed by its store-assigned id:
//! ```text
//! trips/<id>     {"userId": "...", "name": "...", "createdAt": "...", ...}
//! tripDays/<id>  {"tripId": "<trip id>", "orderNumber": 1, ...}
//! ```

mod clock;
mod memory;
mod query;
mod strip;

pub use clock::{format_timestamp, parse_timestamp, Clock, SystemClock};
pub use memory::MemoryDocumentStore;
pub use query::{compare_values, Constraint, Direction, Query};
pub use strip::{strip_absent, StripPolicy};

use async_trait::async_trait;
use thiserror::Error;

use crate::id::EntityId;

/// A stored document body.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Errors raised by a document store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: EntityId },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },
}

impl StoreError {
    pub fn backend(code: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Backend {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Asynchronous CRUD + query access to named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return the id the store assigned to it.
    async fn create(&self, collection: &str, data: Document) -> Result<EntityId, StoreError>;

    /// Write a document at a known id, replacing any existing body.
    async fn put(&self, collection: &str, id: &EntityId, data: Document)
        -> Result<(), StoreError>;

    async fn read(&self, collection: &str, id: &EntityId) -> Result<Option<Document>, StoreError>;

    /// Shallow-merge `patch` into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &EntityId,
        patch: Document,
    ) -> Result<(), StoreError>;

    /// Hard delete. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &EntityId) -> Result<(), StoreError>;

    async fn query(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<Vec<(EntityId, Document)>, StoreError>;

    /// Number of documents matching `constraints`.
    ///
    /// Backends that can count without materializing should override this.
    async fn count(&self, collection: &str, constraints: &[Constraint]) -> Result<usize, StoreError> {
        Ok(self.query(collection, constraints).await?.len())
    }
}

/// Apply a patch the way [`DocumentStore::update`] specifies: top-level keys
/// in `patch` replace those in `target`.
pub fn merge_shallow(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
