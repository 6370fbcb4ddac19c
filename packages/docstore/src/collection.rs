//! Validated names: collections, document ids and queryable field names.
//!
//! The store is schemaless, so collections are plain strings rather than an enum, but every name
//! is checked before it reaches a backend. Names end up inside SurrealQL statements, which is why
//! the accepted character sets are narrow.

use std::fmt;

use crate::error::{StoreError, StoreResult};

pub const USERS: &str = "users";
pub const COMPANIES: &str = "companies";
pub const EMPLOYEES: &str = "employees";
pub const CATEGORIES: &str = "item_categories";
pub const ITEMS: &str = "items";
pub const TRANSACTIONS: &str = "transactions";
pub const TRANSACTION_LINES: &str = "transaction_lines";

/// Key under which a document id is merged into records returned by list and query operations.
pub const ID_FIELD: &str = "id";

const MAX_NAME_LEN: usize = 64;
const MAX_ID_LEN: usize = 128;

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    s.len() <= MAX_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Name of a collection: ASCII letter first, then ASCII alphanumerics or `_`, at most 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(StoreError::invalid(format!("invalid collection name: {name:?}")));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque document id: ASCII alphanumerics, `_` or `-`, at most 128 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> StoreResult<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_ID_LEN
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::invalid(format!("invalid document id: {id:?}")));
        }
        Ok(Self(id))
    }

    /// Fresh id for a document created without a caller-supplied one.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Field name used in an equality filter or a partial update. Same rule as collection names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(StoreError::invalid(format!("invalid field name: {name:?}")));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        for name in [USERS, COMPANIES, EMPLOYEES, CATEGORIES, ITEMS, TRANSACTIONS, TRANSACTION_LINES] {
            assert!(CollectionName::new(name).is_ok(), "{name} should be valid");
        }

        for bad in ["", "1users", "_users", "users;DROP", "user lines", "a/b", "ä"] {
            let err = CollectionName::new(bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidArgument { .. }), "{bad:?}");
        }

        assert!(CollectionName::new("a".repeat(64)).is_ok());
        assert!(CollectionName::new("a".repeat(65)).is_err());
    }

    #[test]
    fn test_document_ids() {
        assert!(DocumentId::new("T1").is_ok());
        assert!(DocumentId::new("abc-DEF_123").is_ok());

        for bad in ["", "a:b", "a b", "⟨x⟩", "x`y"] {
            assert!(DocumentId::new(bad).is_err(), "{bad:?}");
        }
        assert!(DocumentId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert!(DocumentId::new(a.as_str()).is_ok());
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_field_names() {
        assert!(FieldName::new("transactionId").is_ok());
        assert!(FieldName::new("avatar_url").is_ok());
        assert!(FieldName::new("a.b").is_err());
        assert!(FieldName::new("x = 1 OR true").is_err());
    }
}
