//! Fixed-collection convenience layer.
//!
//! Each accessor pins one collection name and stamps creation/update timestamps supplied by the
//! caller. Everything goes through the generic operations on [`DocumentStore`].

use chrono::{DateTime, Utc};

use crate::client::DocumentStore;
use crate::collection::{CATEGORIES, COMPANIES, EMPLOYEES, ITEMS, TRANSACTIONS, TRANSACTION_LINES, USERS};
use crate::document::Document;
use crate::error::StoreResult;
use crate::value::{FieldValue, Fields};

/// Field names used for the creation/update timestamps of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampKeys {
    pub created: &'static str,
    pub updated: &'static str,
}

/// `createdAt` / `updatedAt`, used by every collection except users.
pub const CAMEL_CASE: TimestampKeys = TimestampKeys {
    created: "createdAt",
    updated: "updatedAt",
};

/// `created_at` / `updated_at`, used by users.
pub const SNAKE_CASE: TimestampKeys = TimestampKeys {
    created: "created_at",
    updated: "updated_at",
};

/// Foreign key of a transaction line. Not enforced by the store.
pub const TRANSACTION_ID_FIELD: &str = "transactionId";

/// CRUD pinned to one collection.
#[derive(Debug, Clone, Copy)]
pub struct Records<'a> {
    store: &'a DocumentStore,
    collection: &'static str,
    timestamps: TimestampKeys,
}

impl<'a> Records<'a> {
    pub fn new(store: &'a DocumentStore, collection: &'static str, timestamps: TimestampKeys) -> Self {
        Self {
            store,
            collection,
            timestamps,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Create a record, stamping both timestamps with `at`.
    pub async fn create(&self, fields: Fields, at: DateTime<Utc>) -> StoreResult<String> {
        self.store
            .create(self.collection, self.stamp_created(fields, at))
            .await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Fields>> {
        self.store.get(self.collection, id).await
    }

    /// Merge `fields` into the record and stamp the update timestamp with `at`.
    pub async fn update(&self, id: &str, mut fields: Fields, at: DateTime<Utc>) -> StoreResult<()> {
        fields.insert(self.timestamps.updated.to_string(), FieldValue::Timestamp(at));
        self.store.update(self.collection, id, fields).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(self.collection, id).await
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Document>> {
        self.store.list_all(self.collection).await
    }

    /// Timestamps already present in `fields` are kept; missing ones are set to `at`.
    fn stamp_created(&self, mut fields: Fields, at: DateTime<Utc>) -> Fields {
        for key in [self.timestamps.created, self.timestamps.updated] {
            fields
                .entry(key.to_string())
                .or_insert(FieldValue::Timestamp(at));
        }
        fields
    }
}

/// Transaction lines: records in `transaction_lines` that reference a transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionLines<'a> {
    records: Records<'a>,
}

impl<'a> TransactionLines<'a> {
    /// Create a line for `transaction_id`. The transaction's existence is not checked here.
    pub async fn create(&self, transaction_id: &str, mut fields: Fields, at: DateTime<Utc>) -> StoreResult<String> {
        fields.insert(TRANSACTION_ID_FIELD.to_string(), FieldValue::from(transaction_id));
        self.records.create(fields, at).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Fields>> {
        self.records.get(id).await
    }

    pub async fn update(&self, id: &str, fields: Fields, at: DateTime<Utc>) -> StoreResult<()> {
        self.records.update(id, fields, at).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.records.delete(id).await
    }

    /// All lines whose `transactionId` equals `transaction_id`.
    pub async fn lines_for_transaction(&self, transaction_id: &str) -> StoreResult<Vec<Document>> {
        self.records
            .store
            .query_by_field(self.records.collection, TRANSACTION_ID_FIELD, transaction_id)
            .await
    }
}

impl DocumentStore {
    pub fn users(&self) -> Records<'_> {
        Records::new(self, USERS, SNAKE_CASE)
    }

    pub fn companies(&self) -> Records<'_> {
        Records::new(self, COMPANIES, CAMEL_CASE)
    }

    pub fn employees(&self) -> Records<'_> {
        Records::new(self, EMPLOYEES, CAMEL_CASE)
    }

    pub fn categories(&self) -> Records<'_> {
        Records::new(self, CATEGORIES, CAMEL_CASE)
    }

    pub fn items(&self) -> Records<'_> {
        Records::new(self, ITEMS, CAMEL_CASE)
    }

    pub fn transactions(&self) -> Records<'_> {
        Records::new(self, TRANSACTIONS, CAMEL_CASE)
    }

    pub fn transaction_lines(&self) -> TransactionLines<'_> {
        TransactionLines {
            records: Records::new(self, TRANSACTION_LINES, CAMEL_CASE),
        }
    }
}
