pub mod records;
pub mod transactions;
pub mod users;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "FireGloss API is running",
        "store_status": state.store.status().as_str(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Liveness check that never touches the store.
pub async fn test_handler() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "Backend server is running successfully!",
        "test_data": {
            "server": "axum",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        }
    }))
}
