//! In-process document store used for local development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    new_document_id, Document, DocumentStore, Fields, Filter, StoreError, WriteBatch, WriteOp,
};

type Collection = BTreeMap<String, Fields>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document under a caller-chosen id, replacing any existing one.
    pub async fn insert_with_id(&self, collection: &str, id: &str, data: Fields) {
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    pub async fn count(&self, collection: &str) -> usize {
        let guard = self.collections.read().await;
        guard.get(collection).map_or(0, BTreeMap::len)
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn apply(collections: &mut HashMap<String, Collection>, op: WriteOp) {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            collections.entry(collection).or_default().insert(id, data);
        }
        WriteOp::Update {
            collection,
            id,
            patch,
        } => {
            if let Some(doc) = collections
                .get_mut(&collection)
                .and_then(|c| c.get_mut(&id))
            {
                doc.extend(patch);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|c| c.get(id)).map(|data| Document {
            id: id.to_string(),
            data: data.clone(),
        }))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn add(&self, collection: &str, data: Fields) -> Result<String, StoreError> {
        let id = new_document_id();
        self.insert_with_id(collection, &id, data).await;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        doc.extend(patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        if let Some(c) = guard.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let ops = batch.into_ops();
        let mut guard = self.collections.write().await;

        // Updates against missing documents reject the whole batch before anything is applied.
        for op in &ops {
            if let WriteOp::Update { collection, id, .. } = op {
                let exists = guard.get(collection).is_some_and(|c| c.contains_key(id));
                if !exists {
                    return Err(not_found(collection, id));
                }
            }
        }

        debug!("Committing batch of {} writes", ops.len());
        for op in ops {
            apply(&mut guard, op);
        }
        Ok(())
    }
}
