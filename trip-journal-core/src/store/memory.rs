//! In-process document store.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{merge_shallow, Constraint, Document, DocumentStore, Query, StoreError};
use crate::id::EntityId;

type Collection = BTreeMap<EntityId, Document>;

/// Document store held entirely in memory.
///
/// Documents are returned in id order when a query has no sort key.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.collections.read().await.values().map(|c| c.len()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, data: Document) -> Result<EntityId, StoreError> {
        let id = EntityId::generate();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn put(
        &self,
        collection: &str,
        id: &EntityId,
        data: Document,
    ) -> Result<(), StoreError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(())
    }

    async fn read(&self, collection: &str, id: &EntityId) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &EntityId,
        patch: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.clone(),
            })?;
        merge_shallow(doc, patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> Result<(), StoreError> {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<Vec<(EntityId, Document)>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let query = Query::from_constraints(constraints);
        Ok(query.apply(docs.iter().map(|(id, doc)| (id.clone(), doc.clone()))))
    }

    async fn count(&self, collection: &str, constraints: &[Constraint]) -> Result<usize, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(0);
        };

        let query = Query::from_constraints(constraints);
        let matching = docs.values().filter(|doc| query.matches(doc)).count();
        Ok(query.limit.map_or(matching, |limit| matching.min(limit)))
    }
}
