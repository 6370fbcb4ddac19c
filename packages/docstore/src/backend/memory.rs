use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use super::DocumentBackend;
use crate::collection::{CollectionName, DocumentId, FieldName};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::value::{FieldValue, Fields};

type Table = BTreeMap<String, Fields>;

/// In-process backend with the same contract as the remote store.
///
/// Used by tests and for running the API without a database. Never holds its lock across an
/// await point.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.read().get(collection).map_or(0, BTreeMap::len)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Table>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Table>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn insert(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        let mut tables = self.write();
        let table = tables.entry(collection.to_string()).or_default();
        if table.contains_key(id.as_str()) {
            return Err(StoreError::invalid(format!(
                "document already exists: {collection}/{id}"
            )));
        }
        table.insert(id.to_string(), fields);
        Ok(())
    }

    async fn fetch(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<Option<Fields>> {
        Ok(self
            .read()
            .get(collection.as_str())
            .and_then(|table| table.get(id.as_str()))
            .cloned())
    }

    async fn merge(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        let mut tables = self.write();
        let existing = tables
            .get_mut(collection.as_str())
            .and_then(|table| table.get_mut(id.as_str()))
            .ok_or_else(|| StoreError::not_found(collection.as_str(), id.as_str()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn remove(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<()> {
        if let Some(table) = self.write().get_mut(collection.as_str()) {
            table.remove(id.as_str());
        }
        Ok(())
    }

    async fn scan(&self, collection: &CollectionName) -> StoreResult<Vec<Document>> {
        Ok(self
            .read()
            .get(collection.as_str())
            .map(|table| {
                table
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: &CollectionName,
        field: &FieldName,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .read()
            .get(collection.as_str())
            .map(|table| {
                table
                    .iter()
                    .filter(|(_, fields)| fields.get(field.as_str()) == Some(value))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
