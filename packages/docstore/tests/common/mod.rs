#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docstore::{
    CollectionName, Connector, Credentials, Document, DocumentBackend, DocumentId, DocumentStore,
    FieldName, FieldValue, Fields, InitMode, MemoryBackend, StoreConfig, StoreError, StoreResult,
};

/// Memory backend that counts every call it receives.
#[derive(Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    calls: AtomicUsize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentBackend for RecordingBackend {
    async fn insert(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        self.hit();
        self.inner.insert(collection, id, fields).await
    }

    async fn fetch(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<Option<Fields>> {
        self.hit();
        self.inner.fetch(collection, id).await
    }

    async fn merge(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        self.hit();
        self.inner.merge(collection, id, fields).await
    }

    async fn remove(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<()> {
        self.hit();
        self.inner.remove(collection, id).await
    }

    async fn scan(&self, collection: &CollectionName) -> StoreResult<Vec<Document>> {
        self.hit();
        self.inner.scan(collection).await
    }

    async fn find_by_field(
        &self,
        collection: &CollectionName,
        field: &FieldName,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>> {
        self.hit();
        self.inner.find_by_field(collection, field, value).await
    }
}

/// Connector that hands out a shared backend, or fails, and remembers what it was given.
pub struct FakeConnector {
    pub backend: Arc<RecordingBackend>,
    pub fail_with: Option<StoreError>,
    pub seen: std::sync::Mutex<Vec<Credentials>>,
}

impl FakeConnector {
    pub fn ok(backend: Arc<RecordingBackend>) -> Self {
        Self {
            backend,
            fail_with: None,
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            backend: Arc::new(RecordingBackend::new()),
            fail_with: Some(error),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn connections(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, credentials: &Credentials) -> StoreResult<Arc<dyn DocumentBackend>> {
        self.seen.lock().unwrap().push(credentials.clone());
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(self.backend.clone()),
        }
    }
}

pub fn memory_store() -> DocumentStore {
    DocumentStore::with_backend(StoreConfig::new(InitMode::Strict), Arc::new(MemoryBackend::new()))
}

pub fn ambient_credentials() -> Credentials {
    Credentials {
        address: "127.0.0.1:8000".to_string(),
        username: "root".to_string(),
        password: "root".to_string(),
        namespace: "test".to_string(),
        database: "test".to_string(),
    }
}
