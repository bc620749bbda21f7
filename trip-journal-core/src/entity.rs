//! Typed CRUD over a single collection.
//!
//! [`EntityStore`] turns model structs into documents and back. It stamps
//! `createdAt`/`updatedAt`, strips absent values before every write, and
//! wraps backend failures with the operation and collection that failed.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

use crate::id::EntityId;
use crate::store::{
    format_timestamp, parse_timestamp, strip_absent, Clock, Constraint, Direction, Document,
    DocumentStore, StoreError, StripPolicy, SystemClock,
};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
const ID: &str = "id";

/// A model persisted in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages and logs
    const LABEL: &'static str;
}

/// An entity that belongs to a trip through its `tripId` field.
pub trait TripScoped: Entity {
    /// Default sort applied by `list_by_trip`
    const TRIP_ORDER: Option<(&'static str, Direction)>;

    fn trip_id(&self) -> &EntityId;
}

/// An entity as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<T> {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Restore,
    Read,
    Update,
    Delete,
    List,
    Count,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Restore => "restore",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
            Operation::Count => "count",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by [`EntityStore`] and the repositories built on it.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to {operation} {label} in '{collection}': {source}")]
    Storage {
        operation: Operation,
        label: &'static str,
        collection: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Failed to encode {label} for '{collection}': {reason}")]
    Encode {
        label: &'static str,
        collection: &'static str,
        reason: String,
    },

    #[error("Invalid {label} document {collection}/{id}: {reason}")]
    Decode {
        label: &'static str,
        collection: &'static str,
        id: EntityId,
        reason: String,
    },

    #[error("Trip {trip_id} has no order number left after {last}")]
    OrderNumbersExhausted { trip_id: EntityId, last: u32 },
}

impl RepositoryError {
    /// The backend error underneath, if this failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RepositoryError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            RepositoryError::Storage { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

/// Generic store for one entity type.
pub struct EntityStore<T> {
    backend: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    policy: StripPolicy,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(backend: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            policy: StripPolicy::default(),
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Insert a new entity and return its store-assigned id.
    ///
    /// Both timestamps are set to the same instant.
    pub async fn create(&self, data: &T) -> Result<EntityId, RepositoryError> {
        let now = format_timestamp(&self.clock.now());
        let mut doc = self.encode(data)?;
        doc.insert(CREATED_AT.to_string(), Value::String(now.clone()));
        doc.insert(UPDATED_AT.to_string(), Value::String(now));

        self.backend
            .create(T::COLLECTION, self.strip(doc))
            .await
            .map_err(|e| self.storage_error(Operation::Create, e))
    }

    /// Write a previously read entity back under its original id and
    /// timestamps.
    pub async fn restore(&self, record: &Stored<T>) -> Result<(), RepositoryError> {
        let mut doc = self.encode(&record.data)?;
        doc.insert(
            CREATED_AT.to_string(),
            Value::String(format_timestamp(&record.created_at)),
        );
        doc.insert(
            UPDATED_AT.to_string(),
            Value::String(format_timestamp(&record.updated_at)),
        );

        self.backend
            .put(T::COLLECTION, &record.id, self.strip(doc))
            .await
            .map_err(|e| self.storage_error(Operation::Restore, e))
    }

    /// Returns `Ok(None)` if the document does not exist.
    pub async fn read(&self, id: &EntityId) -> Result<Option<Stored<T>>, RepositoryError> {
        let doc = self
            .backend
            .read(T::COLLECTION, id)
            .await
            .map_err(|e| self.storage_error(Operation::Read, e))?;

        doc.map(|doc| self.decode(id.clone(), doc)).transpose()
    }

    /// Merge `patch` into an existing entity and refresh `updatedAt`.
    ///
    /// `None` fields in the patch are dropped, so they never clear a value.
    /// `createdAt` and `id` in the patch are ignored.
    pub async fn update<P>(&self, id: &EntityId, patch: &P) -> Result<(), RepositoryError>
    where
        P: Serialize + ?Sized,
    {
        let mut doc = self.encode(patch)?;
        doc.remove(ID);
        doc.remove(CREATED_AT);
        doc.insert(
            UPDATED_AT.to_string(),
            Value::String(format_timestamp(&self.clock.now())),
        );

        self.backend
            .update(T::COLLECTION, id, self.strip(doc))
            .await
            .map_err(|e| self.storage_error(Operation::Update, e))
    }

    /// Hard delete without an existence check.
    pub async fn delete(&self, id: &EntityId) -> Result<(), RepositoryError> {
        self.backend
            .delete(T::COLLECTION, id)
            .await
            .map_err(|e| self.storage_error(Operation::Delete, e))
    }

    pub async fn list(&self, constraints: &[Constraint]) -> Result<Vec<Stored<T>>, RepositoryError> {
        let docs = self
            .backend
            .query(T::COLLECTION, constraints)
            .await
            .map_err(|e| self.storage_error(Operation::List, e))?;

        docs.into_iter()
            .map(|(id, doc)| self.decode(id, doc))
            .collect()
    }

    pub async fn list_ordered(
        &self,
        field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Vec<Stored<T>>, RepositoryError> {
        let mut constraints = vec![Constraint::order_by(field, direction)];
        if let Some(limit) = limit {
            constraints.push(Constraint::limit(limit));
        }
        self.list(&constraints).await
    }

    pub async fn count(&self, constraints: &[Constraint]) -> Result<usize, RepositoryError> {
        self.backend
            .count(T::COLLECTION, constraints)
            .await
            .map_err(|e| self.storage_error(Operation::Count, e))
    }

    fn encode<P: Serialize + ?Sized>(&self, data: &P) -> Result<Document, RepositoryError> {
        match serde_json::to_value(data) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(self.encode_error(format!("expected an object, got {}", other))),
            Err(e) => Err(self.encode_error(e.to_string())),
        }
    }

    fn strip(&self, doc: Document) -> Document {
        match strip_absent(Value::Object(doc), &self.policy) {
            Some(Value::Object(map)) => map,
            _ => Document::new(),
        }
    }

    fn decode(&self, id: EntityId, mut doc: Document) -> Result<Stored<T>, RepositoryError> {
        let created_at = take_timestamp(&mut doc, CREATED_AT)
            .ok_or_else(|| self.decode_error(&id, "missing or invalid createdAt".to_string()))?;
        let updated_at = take_timestamp(&mut doc, UPDATED_AT)
            .ok_or_else(|| self.decode_error(&id, "missing or invalid updatedAt".to_string()))?;
        doc.remove(ID);

        let data = serde_json::from_value(Value::Object(doc))
            .map_err(|e| self.decode_error(&id, e.to_string()))?;

        Ok(Stored {
            id,
            created_at,
            updated_at,
            data,
        })
    }

    fn storage_error(&self, operation: Operation, source: StoreError) -> RepositoryError {
        tracing::error!(
            collection = T::COLLECTION,
            %operation,
            error = %source,
            "Storage operation failed"
        );
        RepositoryError::Storage {
            operation,
            label: T::LABEL,
            collection: T::COLLECTION,
            source,
        }
    }

    fn encode_error(&self, reason: String) -> RepositoryError {
        RepositoryError::Encode {
            label: T::LABEL,
            collection: T::COLLECTION,
            reason,
        }
    }

    fn decode_error(&self, id: &EntityId, reason: String) -> RepositoryError {
        tracing::warn!(collection = T::COLLECTION, %id, %reason, "Malformed document");
        RepositoryError::Decode {
            label: T::LABEL,
            collection: T::COLLECTION,
            id: id.clone(),
            reason,
        }
    }
}

fn take_timestamp(doc: &mut Document, key: &str) -> Option<DateTime<Utc>> {
    doc.remove(key)
        .and_then(|value| value.as_str().and_then(parse_timestamp))
}
