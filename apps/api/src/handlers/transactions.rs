use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use docstore::{Document, DocumentStore};
use serde_json::json;
use tracing::{debug, instrument, Span};
use tracing::field::Empty;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    document_json, documents_json, to_fields, ApiJson, ApiResponse, TransactionCreate,
    TransactionLineCreate, TransactionUpdate, TRANSACTION_TIMESTAMPS,
};
use crate::AppState;

async fn require_transaction(store: &DocumentStore, transaction_id: &str) -> ApiResult<Document> {
    let fields = store
        .transactions()
        .get(transaction_id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;
    Ok(Document::new(transaction_id, fields))
}

#[instrument(skip(state))]
pub async fn list_transactions(State(state): State<AppState>) -> ApiResult<Json<ApiResponse>> {
    let transactions = state.store.transactions().list_all().await?;

    Ok(Json(ApiResponse::with_data(
        "Transactions retrieved successfully",
        json!({ "transactions": documents_json(transactions) }),
    )))
}

#[instrument(skip_all, fields(number = %payload.transaction_number, transaction_id = Empty))]
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TransactionCreate>,
) -> ApiResult<Json<ApiResponse>> {
    let fields = to_fields(&payload, TRANSACTION_TIMESTAMPS)?;
    let transaction_id = state.store.transactions().create(fields, Utc::now()).await?;
    Span::current().record("transaction_id", transaction_id.as_str());

    let created = require_transaction(&state.store, &transaction_id).await?;

    Ok(Json(ApiResponse::with_data(
        "Transaction created successfully",
        json!({ "transaction": document_json(created) }),
    )))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    let transaction = require_transaction(&state.store, &transaction_id).await?;

    Ok(Json(ApiResponse::with_data(
        "Transaction retrieved successfully",
        json!({ "transaction": document_json(transaction) }),
    )))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    ApiJson(payload): ApiJson<TransactionUpdate>,
) -> ApiResult<Json<ApiResponse>> {
    require_transaction(&state.store, &transaction_id).await?;

    let fields = to_fields(&payload, &[])?;
    state
        .store
        .transactions()
        .update(&transaction_id, fields, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok("Transaction updated successfully")))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    require_transaction(&state.store, &transaction_id).await?;
    state.store.transactions().delete(&transaction_id).await?;

    Ok(Json(ApiResponse::ok("Transaction deleted successfully")))
}

#[instrument(skip(state))]
pub async fn list_lines(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    require_transaction(&state.store, &transaction_id).await?;
    let lines = state
        .store
        .transaction_lines()
        .lines_for_transaction(&transaction_id)
        .await?;
    debug!(count = lines.len(), "Loaded transaction lines");

    Ok(Json(ApiResponse::with_data(
        "Transaction lines retrieved successfully",
        json!({ "lines": documents_json(lines) }),
    )))
}

#[instrument(skip(state, payload))]
pub async fn add_line(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
    ApiJson(payload): ApiJson<TransactionLineCreate>,
) -> ApiResult<Json<ApiResponse>> {
    require_transaction(&state.store, &transaction_id).await?;

    let fields = to_fields(&payload, &[])?;
    let line_id = state
        .store
        .transaction_lines()
        .create(&transaction_id, fields, Utc::now())
        .await?;

    Ok(Json(ApiResponse::with_data(
        "Transaction line added successfully",
        json!({ "line_id": line_id }),
    )))
}
