//! Create/list/update/delete routes shared by companies, employees, categories and items.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use docstore::FieldValue;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::ApiResult;
use crate::models::{documents_json, to_fields, ApiJson, ApiResponse, Resource};
use crate::AppState;

#[instrument(skip_all, fields(collection = R::PLURAL))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<R::Create>,
) -> ApiResult<Json<ApiResponse>> {
    let mut fields = to_fields(&payload, R::TIMESTAMPS)?;
    if R::MARK_ACTIVE {
        fields.insert("isActive".to_string(), FieldValue::Bool(true));
    }

    let id = R::records(&state.store).create(fields, Utc::now()).await?;
    debug!(%id, "Record created");

    Ok(Json(ApiResponse::with_data(
        format!("{} created successfully", R::LABEL),
        json!({ "id": id }),
    )))
}

#[instrument(skip_all, fields(collection = R::PLURAL))]
pub async fn list<R: Resource>(State(state): State<AppState>) -> ApiResult<Json<ApiResponse>> {
    let docs = R::records(&state.store).list_all().await?;
    let count = docs.len();

    let mut data = serde_json::Map::new();
    data.insert(R::PLURAL.to_string(), documents_json(docs));
    data.insert("count".to_string(), json!(count));

    Ok(Json(ApiResponse::with_data(
        format!("Retrieved {count} {}", R::PLURAL),
        Value::Object(data),
    )))
}

#[instrument(skip(state, payload), fields(collection = R::PLURAL))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<R::Update>,
) -> ApiResult<Json<ApiResponse>> {
    let fields = to_fields(&payload, &[])?;
    R::records(&state.store).update(&id, fields, Utc::now()).await?;

    Ok(Json(ApiResponse::ok(format!("{} updated successfully", R::LABEL))))
}

#[instrument(skip(state), fields(collection = R::PLURAL))]
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    R::records(&state.store).delete(&id).await?;

    Ok(Json(ApiResponse::ok(format!("{} deleted successfully", R::LABEL))))
}
