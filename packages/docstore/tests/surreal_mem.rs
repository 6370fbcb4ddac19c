use std::sync::Arc;

use chrono::{TimeZone, Utc};

use docstore::{fields, DocumentStore, FieldValue, InitMode, StoreConfig, StoreError, SurrealBackend};
use surrealdb::engine::local::Mem;
use surrealdb::Surreal;

async fn surreal_store() -> DocumentStore {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    DocumentStore::with_backend(StoreConfig::new(InitMode::Strict), Arc::new(SurrealBackend::new(db)))
}

#[tokio::test]
async fn test_surreal_crud_cycle() {
    let store = surreal_store().await;

    let id = store
        .create("items", fields! { "name" => "Haircut", "sku" => "H-1", "isActive" => true })
        .await
        .unwrap();

    let stored = store.get("items", &id).await.unwrap().unwrap();
    assert_eq!(stored["name"], FieldValue::from("Haircut"));
    assert_eq!(stored["isActive"], FieldValue::Bool(true));
    assert!(!stored.contains_key("id"));

    store.update("items", &id, fields! { "name" => "Trim" }).await.unwrap();
    let stored = store.get("items", &id).await.unwrap().unwrap();
    assert_eq!(stored["name"], FieldValue::from("Trim"));
    assert_eq!(stored["sku"], FieldValue::from("H-1"));

    store.delete("items", &id).await.unwrap();
    assert_eq!(store.get("items", &id).await.unwrap(), None);
    store.delete("items", &id).await.unwrap();
}

#[tokio::test]
async fn test_surreal_update_missing_is_not_found() {
    let store = surreal_store().await;
    let err = store
        .update("items", "ghost", fields! { "name" => "x" })
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::not_found("items", "ghost"));
}

#[tokio::test]
async fn test_surreal_list_and_query() {
    let store = surreal_store().await;
    assert!(store.list_all("transaction_lines").await.unwrap().is_empty());

    let a = store
        .create("transaction_lines", fields! { "transactionId" => "T1" })
        .await
        .unwrap();
    let b = store
        .create("transaction_lines", fields! { "transactionId" => "T1" })
        .await
        .unwrap();
    store
        .create("transaction_lines", fields! { "transactionId" => "T2" })
        .await
        .unwrap();

    assert_eq!(store.list_all("transaction_lines").await.unwrap().len(), 3);

    let mut found: Vec<String> = store
        .query_by_field("transaction_lines", "transactionId", "T1")
        .await
        .unwrap()
        .into_iter()
        .map(|doc| doc.id)
        .collect();
    found.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_surreal_typed_round_trip() {
    let store = surreal_store().await;
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    let fields = fields! {
        "name" => "Haircut",
        "price" => 30.0,
        "durationMinutes" => 45,
        "sku" => FieldValue::Null,
        "createdAt" => at,
        "meta" => fields! { "color" => "#ff0000" },
    };

    let id = store.create("items", fields.clone()).await.unwrap();
    assert_eq!(store.get("items", &id).await.unwrap(), Some(fields));
}

#[tokio::test]
async fn test_surreal_query_by_field_matches_type_exactly() {
    let store = surreal_store().await;
    let int_id = store.create("items", fields! { "price" => 30 }).await.unwrap();
    let float_id = store.create("items", fields! { "price" => 30.0 }).await.unwrap();

    let ints = store.query_by_field("items", "price", 30).await.unwrap();
    assert_eq!(ints.len(), 1);
    assert_eq!(ints[0].id, int_id);
    assert_eq!(ints[0].fields["price"], FieldValue::Integer(30));

    let floats = store.query_by_field("items", "price", 30.0).await.unwrap();
    assert_eq!(floats.len(), 1);
    assert_eq!(floats[0].id, float_id);
}
