//! Storage backends behind the document store client.
//!
//! The client owns validation, connection state and timeouts; a backend only moves documents.
//! All implementations must satisfy the same contract:
//! - `insert` fails if the id is already taken,
//! - `fetch` returns `None` for absent documents,
//! - `merge` fails with `NotFound` for absent documents and leaves unmentioned fields untouched,
//! - `remove` succeeds whether or not the document exists,
//! - `find_by_field` matches by exact `FieldValue` equality, so `30` and `30.0` are different,
//! - stored fields never contain the document id.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collection::{CollectionName, DocumentId, FieldName};
use crate::config::Credentials;
use crate::document::Document;
use crate::error::StoreResult;
use crate::value::{FieldValue, Fields};

mod memory;
mod surreal;

pub use memory::MemoryBackend;
pub use surreal::{SurrealBackend, SurrealConnector};

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn insert(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()>;

    async fn fetch(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<Option<Fields>>;

    async fn merge(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()>;

    async fn remove(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<()>;

    /// Every document of the collection, in backend order.
    async fn scan(&self, collection: &CollectionName) -> StoreResult<Vec<Document>>;

    /// Documents whose `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &CollectionName,
        field: &FieldName,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>>;

    /// Release the underlying handle. Called once on shutdown.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Opens a backend from credentials. Used by `DocumentStore::init`.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> StoreResult<Arc<dyn DocumentBackend>>;
}
