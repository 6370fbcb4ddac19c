//! Client for the FireGloss document store.
//!
//! [`DocumentStore`] owns the connection to the backing store (SurrealDB in production, an
//! in-memory backend in tests), validates names, bounds every call with a timeout and returns
//! typed [`StoreError`]s. The domain accessors (`users()`, `transactions()`, ...) are thin
//! fixed-collection wrappers over the generic operations.

pub mod backend;
pub mod client;
pub mod collection;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod value;

pub use backend::{Connector, DocumentBackend, MemoryBackend, SurrealBackend, SurrealConnector};
pub use client::{ConnectionStatus, DocumentStore};
pub use collection::{CollectionName, DocumentId, FieldName, ID_FIELD};
pub use config::{Credentials, InitMode, StoreConfig};
pub use document::Document;
pub use domain::{Records, TimestampKeys, TransactionLines, TRANSACTION_ID_FIELD};
pub use error::{StoreError, StoreResult};
pub use value::{fields_from_json, FieldValue, Fields};
