#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use docstore::{DocumentStore, InitMode, MemoryBackend, StoreConfig};
use firegloss_api::{create_app, metrics::Metrics, AppState};
use http_body_util::BodyExt;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

pub fn state_with(store: DocumentStore) -> AppState {
    let provider = SdkMeterProvider::builder().build();
    AppState {
        store: Arc::new(store),
        metrics: Arc::new(Metrics::new(&provider)),
    }
}

/// Router over an in-memory store, plus the store for direct inspection.
pub fn memory_app() -> (Router, Arc<DocumentStore>) {
    let store = DocumentStore::with_backend(
        StoreConfig::new(InitMode::Strict),
        Arc::new(MemoryBackend::new()),
    );
    let state = state_with(store);
    let store = state.store.clone();
    (create_app(state), store)
}

/// Router over a store that initialized without credentials in permissive mode.
pub async fn degraded_app() -> Router {
    let store = DocumentStore::new(StoreConfig::new(InitMode::Permissive));
    store.init().await.unwrap();
    create_app(state_with(store))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
