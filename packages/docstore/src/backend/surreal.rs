//! SurrealDB backend: collections are tables, document ids are record keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::remote::ws::Ws;
use surrealdb::opt::auth::Root;
use surrealdb::types::{Array, Datetime, Number, Object, RecordId, Value};
use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use super::{Connector, DocumentBackend};
use crate::collection::{CollectionName, DocumentId, FieldName};
use crate::config::Credentials;
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::value::{FieldValue, Fields};

/// Opens a WebSocket connection, signs in as a root user and selects namespace/database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurrealConnector;

#[async_trait]
impl Connector for SurrealConnector {
    async fn connect(&self, credentials: &Credentials) -> StoreResult<Arc<dyn DocumentBackend>> {
        info!(addr = %credentials.address, "Connecting to SurrealDB");

        let db = Surreal::new::<Ws>(&credentials.address).await?;

        db.signin(Root {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
        .await?;

        db.use_ns(&credentials.namespace)
            .use_db(&credentials.database)
            .await?;

        info!(
            namespace = %credentials.namespace,
            database = %credentials.database,
            "Connected to SurrealDB"
        );
        Ok(Arc::new(SurrealBackend::new(db)))
    }
}

/// Document backend over any SurrealDB engine.
///
/// Table and field names are interpolated into statements escaped with backticks; they are
/// validated identifiers by the time they get here. Record ids and values are always bound.
pub struct SurrealBackend<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBackend<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_rows(&self, sql: String, bindings: Vec<(String, Value)>) -> StoreResult<Vec<Document>> {
        let mut query = self.db.query(sql);
        for binding in bindings {
            query = query.bind(binding);
        }
        let mut response = query.await?.check()?;
        let rows: Vec<Value> = response.take(0)?;
        rows.into_iter().map(row_to_document).collect()
    }
}

#[async_trait]
impl<C: Connection> DocumentBackend for SurrealBackend<C> {
    async fn insert(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        debug!(%collection, %id, "CREATE");
        self.db
            .query("CREATE $rid CONTENT $data RETURN NONE")
            .bind(("rid", record_id(collection, id)))
            .bind(("data", encode_fields(fields)))
            .await?
            .check()
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("already exists") {
                    StoreError::invalid(format!("document already exists: {collection}/{id}"))
                } else {
                    StoreError::unavailable(message)
                }
            })?;
        Ok(())
    }

    async fn fetch(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<Option<Fields>> {
        debug!(%collection, %id, "SELECT");
        let rows = self
            .select_rows(
                "SELECT * FROM $rid".to_string(),
                vec![("rid".to_string(), Value::RecordId(record_id(collection, id)))],
            )
            .await?;
        Ok(rows.into_iter().next().map(|doc| doc.fields))
    }

    async fn merge(&self, collection: &CollectionName, id: &DocumentId, fields: Fields) -> StoreResult<()> {
        debug!(%collection, %id, fields = fields.len(), "UPDATE");

        let rid = Value::RecordId(record_id(collection, id));
        let (sql, bindings) = if fields.is_empty() {
            ("SELECT id FROM $rid".to_string(), vec![("rid".to_string(), rid)])
        } else {
            let mut assignments = Vec::with_capacity(fields.len());
            let mut bindings = Vec::with_capacity(fields.len() + 1);
            bindings.push(("rid".to_string(), rid));
            for (idx, (name, value)) in fields.into_iter().enumerate() {
                assignments.push(format!("`{name}` = $v{idx}"));
                bindings.push((format!("v{idx}"), encode(value)));
            }
            (
                format!("UPDATE $rid SET {} RETURN id", assignments.join(", ")),
                bindings,
            )
        };

        let mut query = self.db.query(sql);
        for binding in bindings {
            query = query.bind(binding);
        }
        let mut response = query.await?.check()?;
        let touched: Vec<Value> = response.take(0)?;
        if touched.is_empty() {
            return Err(StoreError::not_found(collection.as_str(), id.as_str()));
        }
        Ok(())
    }

    async fn remove(&self, collection: &CollectionName, id: &DocumentId) -> StoreResult<()> {
        debug!(%collection, %id, "DELETE");
        self.db
            .query("DELETE $rid RETURN NONE")
            .bind(("rid", record_id(collection, id)))
            .await?
            .check()?;
        Ok(())
    }

    async fn scan(&self, collection: &CollectionName) -> StoreResult<Vec<Document>> {
        debug!(%collection, "SELECT all");
        self.select_rows(format!("SELECT * FROM `{collection}`"), Vec::new())
            .await
    }

    async fn find_by_field(
        &self,
        collection: &CollectionName,
        field: &FieldName,
        value: &FieldValue,
    ) -> StoreResult<Vec<Document>> {
        debug!(%collection, %field, "SELECT where");
        let rows = self
            .select_rows(
                format!("SELECT * FROM `{collection}` WHERE `{field}` = $value"),
                vec![("value".to_string(), encode(value.clone()))],
            )
            .await?;

        // SurrealQL equality coerces numbers (`30 = 30.0`); keep only exact matches.
        Ok(rows
            .into_iter()
            .filter(|doc| doc.fields.get(field.as_str()) == Some(value))
            .collect())
    }
}

fn record_id(collection: &CollectionName, id: &DocumentId) -> RecordId {
    RecordId {
        table: collection.as_str().into(),
        key: id.as_str().into(),
    }
}

fn encode_fields(fields: Fields) -> Value {
    let obj: BTreeMap<String, Value> = fields.into_iter().map(|(k, v)| (k, encode(v))).collect();
    Value::Object(Object::from(obj))
}

fn encode(value: FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(b),
        FieldValue::Integer(i) => Value::Number(Number::from(i)),
        FieldValue::Float(f) => Value::Number(Number::from(f)),
        FieldValue::String(s) => Value::String(s),
        FieldValue::Timestamp(ts) => Value::Datetime(Datetime::from(ts)),
        FieldValue::Array(items) => {
            let converted: Vec<Value> = items.into_iter().map(encode).collect();
            Value::Array(Array::from(converted))
        }
        FieldValue::Map(map) => encode_fields(map),
    }
}

/// Split a selected row into its record key and the remaining fields.
fn row_to_document(row: Value) -> StoreResult<Document> {
    let json = serde_json::to_value(&row)
        .map_err(|e| StoreError::unavailable(format!("failed to read row: {e}")))?;

    let mut fields = match decode(json) {
        FieldValue::Map(map) => map,
        other => {
            return Err(StoreError::unavailable(format!(
                "expected an object row, got {other:?}"
            )))
        }
    };

    let id = fields
        .remove("id")
        .and_then(|raw| match raw {
            FieldValue::String(s) => Some(strip_table(&s)),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Map(map) => record_key(&map),
            _ => None,
        })
        .ok_or_else(|| StoreError::unavailable("row without a record id"))?;

    Ok(Document::new(id, fields))
}

fn record_key(map: &Fields) -> Option<String> {
    match map.get("key")? {
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// `items:abc`, `items:⟨abc⟩` and `` items:`abc` `` all yield `abc`.
fn strip_table(raw: &str) -> String {
    let key = raw.split_once(':').map_or(raw, |(_, key)| key);
    key.trim_start_matches(['⟨', '`'])
        .trim_end_matches(['⟩', '`'])
        .to_string()
}

/// Decode the JSON serialization of a selected row.
///
/// SurrealDB serializes its values as externally tagged enums (`{"String": "x"}`,
/// `{"Number": {"Int": 3}}`, `"None"`, ...). A row that arrives as a tagged `Object` is decoded
/// tag by tag; anything else is read as plain JSON.
fn decode(json: serde_json::Value) -> FieldValue {
    match &json {
        serde_json::Value::Object(map) if map.len() == 1 && map.contains_key("Object") => decode_tagged(json),
        _ => FieldValue::from(json),
    }
}

fn decode_tagged(json: serde_json::Value) -> FieldValue {
    use serde_json::Value as Json;
    match json {
        Json::String(s) if s == "None" || s == "Null" => FieldValue::Null,
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(decoded) = map.iter().next().and_then(|(tag, inner)| decode_variant(tag, inner)) {
                    return decoded;
                }
            }
            FieldValue::Map(map.into_iter().map(|(k, v)| (k, decode_tagged(v))).collect())
        }
        Json::Array(items) => FieldValue::Array(items.into_iter().map(decode_tagged).collect()),
        other => FieldValue::from(other),
    }
}

fn decode_variant(tag: &str, inner: &serde_json::Value) -> Option<FieldValue> {
    use serde_json::Value as Json;
    match tag {
        "None" | "Null" => Some(FieldValue::Null),
        "Bool" => inner.as_bool().map(FieldValue::Bool),
        "Number" => match inner {
            Json::Number(_) => Some(FieldValue::from(inner.clone())),
            Json::Object(map) if map.len() == 1 => map
                .iter()
                .next()
                .and_then(|(tag, inner)| decode_variant(tag, inner)),
            Json::String(s) => s.parse::<f64>().ok().map(FieldValue::Float),
            _ => None,
        },
        "Int" => inner.as_i64().map(FieldValue::Integer),
        "Float" => inner.as_f64().map(FieldValue::Float),
        "Decimal" => match inner {
            Json::String(s) => s.parse::<f64>().ok().map(FieldValue::Float),
            other => other.as_f64().map(FieldValue::Float),
        },
        "String" | "Strand" | "Uuid" | "Duration" => inner.as_str().map(FieldValue::from),
        "Datetime" => inner
            .as_str()
            .map(|s| FieldValue::from(s).parse_timestamp()),
        "Array" => inner
            .as_array()
            .map(|items| FieldValue::Array(items.iter().cloned().map(decode_tagged).collect())),
        "Object" => inner.as_object().map(|map| {
            FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), decode_tagged(v.clone())))
                    .collect(),
            )
        }),
        "RecordId" | "Thing" => match decode_tagged(inner.clone()) {
            FieldValue::Map(map) => {
                let table = map.get("table").and_then(FieldValue::as_str)?.to_string();
                let key = record_key(&map)?;
                Some(FieldValue::String(format!("{table}:{key}")))
            }
            FieldValue::String(s) => Some(FieldValue::String(s)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_decode_tagged_values() {
        let row = json!({
            "Object": {
                "id": { "RecordId": { "table": { "String": "items" }, "key": { "String": "X" } } },
                "name": { "String": "Haircut" },
                "price": { "Number": { "Float": 30.0 } },
                "qty": { "Number": { "Int": 2 } },
                "active": { "Bool": true },
                "notes": "None",
                "at": { "Datetime": "2024-05-01T12:30:00Z" },
                "tags": { "Array": [ { "String": "a" } ] }
            }
        });

        let FieldValue::Map(fields) = decode(row) else {
            panic!("expected map");
        };
        assert_eq!(fields["id"], FieldValue::from("items:X"));
        assert_eq!(fields["name"], FieldValue::from("Haircut"));
        assert_eq!(fields["price"], FieldValue::Float(30.0));
        assert_eq!(fields["qty"], FieldValue::Integer(2));
        assert_eq!(fields["active"], FieldValue::Bool(true));
        assert!(fields["notes"].is_null());
        assert_eq!(
            fields["at"],
            FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(fields["tags"], FieldValue::Array(vec!["a".into()]));
    }

    #[test]
    fn test_decode_plain_json() {
        let FieldValue::Map(fields) = decode(json!({ "id": "items:⟨X⟩", "price": 30.0, "note": "None" })) else {
            panic!("expected map");
        };
        assert_eq!(fields["price"], FieldValue::Float(30.0));
        assert_eq!(fields["note"], FieldValue::from("None"));
        assert_eq!(strip_table(fields["id"].as_str().unwrap()), "X");
    }

    #[test]
    fn test_strip_table() {
        assert_eq!(strip_table("items:abc"), "abc");
        assert_eq!(strip_table("items:⟨abc-1⟩"), "abc-1");
        assert_eq!(strip_table("items:`abc`"), "abc");
        assert_eq!(strip_table("abc"), "abc");
    }

    #[test]
    fn test_record_key_from_map() {
        let map = crate::fields! { "table" => "items", "key" => "X" };
        assert_eq!(record_key(&map).as_deref(), Some("X"));
        let numeric = crate::fields! { "table" => "items", "key" => 7 };
        assert_eq!(record_key(&numeric).as_deref(), Some("7"));
    }
}
