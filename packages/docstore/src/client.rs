//! The document store client: connection lifecycle plus the generic CRUD primitives.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::backend::{Connector, DocumentBackend, SurrealConnector};
use crate::collection::{CollectionName, DocumentId, FieldName, ID_FIELD};
use crate::config::{Credentials, InitMode, StoreConfig};
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::value::{FieldValue, Fields};

/// Observable state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Uninitialized,
    Connected,
    Degraded,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Connection {
    Uninitialized,
    Connected(Arc<dyn DocumentBackend>),
    Degraded { reason: String },
}

impl Connection {
    fn status(&self) -> ConnectionStatus {
        match self {
            Self::Uninitialized => ConnectionStatus::Uninitialized,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Degraded { .. } => ConnectionStatus::Degraded,
        }
    }
}

/// Client for the document store.
///
/// Constructed explicitly and shared by reference (usually `Arc<DocumentStore>`); there is no
/// process-wide instance. The connection is established once by [`DocumentStore::init`] and is
/// never re-established implicitly. Every operation checks the connection first and fails with
/// [`StoreError::NotInitialized`] without touching the backend when it is not connected.
///
/// Operations take no client-side locks around I/O: concurrent writes to the same document race
/// at the store with last-writer-wins semantics and there is no version check.
pub struct DocumentStore {
    config: StoreConfig,
    connection: RwLock<Connection>,
}

impl DocumentStore {
    /// New client in the `Uninitialized` state.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            connection: RwLock::new(Connection::Uninitialized),
        }
    }

    /// Client that is already connected to `backend`.
    pub fn with_backend(config: StoreConfig, backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            config,
            connection: RwLock::new(Connection::Connected(backend)),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn status(&self) -> ConnectionStatus {
        self.read_connection().status()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Why the connection is degraded, if it is.
    pub fn degraded_reason(&self) -> Option<String> {
        match &*self.read_connection() {
            Connection::Degraded { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    /// Connect to SurrealDB using the configured credential sources.
    pub async fn init(&self) -> StoreResult<ConnectionStatus> {
        self.init_with(&SurrealConnector).await
    }

    /// Run initialization with a caller-supplied connector.
    ///
    /// Credential file first, then (strict mode only) ambient credentials. The connect attempt is
    /// bounded by the configured timeout. Whatever happens, the client ends up `Connected` or
    /// `Degraded`. In strict mode a failure is also returned to the
    /// caller; in permissive mode it is logged and `Ok(Degraded)` is returned.
    pub async fn init_with(&self, connector: &dyn Connector) -> StoreResult<ConnectionStatus> {
        if self.status() != ConnectionStatus::Uninitialized {
            return Err(StoreError::invalid("document store is already initialized"));
        }

        let outcome = match self.resolve_credentials() {
            Ok(credentials) => self.guarded(connector.connect(&credentials)).await,
            Err(e) => Err(e),
        };

        let mut connection = self.write_connection();
        if !matches!(*connection, Connection::Uninitialized) {
            return Err(StoreError::invalid("document store was initialized concurrently"));
        }

        match outcome {
            Ok(backend) => {
                *connection = Connection::Connected(backend);
                info!(mode = %self.config.init_mode, "Document store connected");
                Ok(ConnectionStatus::Connected)
            }
            Err(e) => {
                *connection = Connection::Degraded {
                    reason: e.to_string(),
                };
                match self.config.init_mode {
                    InitMode::Strict => Err(e),
                    InitMode::Permissive => {
                        warn!(error = %e, "Document store running degraded; every operation will fail");
                        Ok(ConnectionStatus::Degraded)
                    }
                }
            }
        }
    }

    fn resolve_credentials(&self) -> StoreResult<Credentials> {
        if let Some(path) = &self.config.credentials_path {
            if path.exists() {
                debug!(path = %path.display(), "Using credential file");
                return Credentials::from_file(path);
            }
            debug!(path = %path.display(), "Credential file not found");
        }

        match self.config.init_mode {
            InitMode::Strict => self.config.ambient_credentials.clone().ok_or_else(|| {
                StoreError::not_initialized("no credential file and no ambient credentials (SURREALDB_ADDR)")
            }),
            InitMode::Permissive => Err(StoreError::not_initialized("no credential file configured")),
        }
    }

    /// Drop the handle. Subsequent operations fail with `NotInitialized`.
    pub async fn shutdown(&self) -> StoreResult<()> {
        let previous = std::mem::replace(&mut *self.write_connection(), Connection::Uninitialized);
        if let Connection::Connected(backend) = previous {
            backend.close().await?;
            info!("Document store connection closed");
        }
        Ok(())
    }

    // --- Generic operations ---

    /// Store a new document under a generated id and return the id.
    pub async fn create(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.insert(collection, DocumentId::generate(), fields).await
    }

    /// Store a new document under a caller-supplied id.
    pub async fn create_with_id(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<String> {
        self.insert(collection, DocumentId::new(id)?, fields).await
    }

    async fn insert(&self, collection: &str, id: DocumentId, fields: Fields) -> StoreResult<String> {
        let collection = CollectionName::new(collection)?;
        check_writable(&fields)?;
        let backend = self.backend()?;

        debug!(%collection, %id, "create");
        self.guarded(backend.insert(&collection, &id, fields)).await?;
        Ok(id.into_string())
    }

    /// The document's fields, or `None` if it does not exist.
    pub async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Fields>> {
        let collection = CollectionName::new(collection)?;
        let id = DocumentId::new(id)?;
        let backend = self.backend()?;

        debug!(%collection, %id, "get");
        self.guarded(backend.fetch(&collection, &id)).await
    }

    /// Merge `fields` into an existing document. Fields not mentioned are left untouched.
    pub async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let collection = CollectionName::new(collection)?;
        let id = DocumentId::new(id)?;
        check_writable(&fields)?;
        let backend = self.backend()?;

        debug!(%collection, %id, fields = fields.len(), "update");
        self.guarded(backend.merge(&collection, &id, fields)).await
    }

    /// Remove a document. Removing an absent document succeeds.
    pub async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let collection = CollectionName::new(collection)?;
        let id = DocumentId::new(id)?;
        let backend = self.backend()?;

        debug!(%collection, %id, "delete");
        self.guarded(backend.remove(&collection, &id)).await
    }

    /// Every document in the collection. Order is unspecified.
    pub async fn list_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collection = CollectionName::new(collection)?;
        let backend = self.backend()?;

        let docs = self.guarded(backend.scan(&collection)).await?;
        debug!(%collection, count = docs.len(), "list_all");
        Ok(docs)
    }

    /// Documents whose `field` equals `value`. Order is unspecified.
    pub async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> StoreResult<Vec<Document>> {
        let collection = CollectionName::new(collection)?;
        let field = FieldName::new(field)?;
        let value = value.into();
        let backend = self.backend()?;

        let docs = self
            .guarded(backend.find_by_field(&collection, &field, &value))
            .await?;
        debug!(%collection, %field, count = docs.len(), "query_by_field");
        Ok(docs)
    }

    // --- Helpers ---

    fn backend(&self) -> StoreResult<Arc<dyn DocumentBackend>> {
        match &*self.read_connection() {
            Connection::Connected(backend) => Ok(Arc::clone(backend)),
            Connection::Uninitialized => Err(StoreError::not_initialized("init has not been called")),
            Connection::Degraded { reason } => Err(StoreError::not_initialized(reason.clone())),
        }
    }

    async fn guarded<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        match tokio::time::timeout(self.config.timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::unavailable(format!(
                "operation timed out after {}ms",
                self.config.timeout.as_millis()
            ))),
        }
    }

    fn read_connection(&self) -> std::sync::RwLockReadGuard<'_, Connection> {
        self.connection.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_connection(&self) -> std::sync::RwLockWriteGuard<'_, Connection> {
        self.connection.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("status", &self.status())
            .field("init_mode", &self.config.init_mode)
            .finish()
    }
}

/// Written field names must be identifiers and must not use the reserved id key.
fn check_writable(fields: &Fields) -> StoreResult<()> {
    for name in fields.keys() {
        if name == ID_FIELD {
            return Err(StoreError::invalid(format!(
                "field {ID_FIELD:?} is reserved for the document id"
            )));
        }
        FieldName::new(name.as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::fields;

    fn connected() -> DocumentStore {
        DocumentStore::with_backend(StoreConfig::new(InitMode::Strict), Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_uninitialized_rejects_operations() {
        let store = DocumentStore::new(StoreConfig::new(InitMode::Strict));
        assert_eq!(store.status(), ConnectionStatus::Uninitialized);
        assert!(!store.is_ready());

        let err = store.get("items", "X").await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn test_validation_precedes_connection_check() {
        let store = DocumentStore::new(StoreConfig::new(InitMode::Strict));
        let err = store.get("bad name", "X").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_reserved_id_field_rejected() {
        let store = connected();
        let err = store
            .create("items", fields! { "id" => "sneaky", "name" => "x" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));

        let err = store
            .create("items", fields! { "bad-name" => 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_returns_to_uninitialized() {
        let store = connected();
        assert!(store.is_ready());
        store.shutdown().await.unwrap();
        assert_eq!(store.status(), ConnectionStatus::Uninitialized);
        assert!(matches!(
            store.list_all("items").await,
            Err(StoreError::NotInitialized { .. })
        ));
        // second shutdown is a no-op
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_with_id() {
        let store = connected();
        let id = store
            .create_with_id("users", "u-1", fields! { "name" => "Ada" })
            .await
            .unwrap();
        assert_eq!(id, "u-1");
        assert!(store.get("users", "u-1").await.unwrap().is_some());

        let err = store
            .create_with_id("users", "u-1", fields! { "name" => "Bob" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::Degraded.to_string(), "degraded");
        assert_eq!(ConnectionStatus::Connected.as_str(), "connected");
    }
}
