use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{ApiError, ApiResult};
use crate::models::{
    document_json, documents_json, to_fields, ApiJson, ApiResponse, UserCreate, UserUpdate,
};
use crate::AppState;

#[instrument(skip_all, fields(email = %payload.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> ApiResult<Json<ApiResponse>> {
    let fields = to_fields(&payload, &[])?;
    let user_id = state.store.users().create(fields, Utc::now()).await?;
    debug!(%user_id, "User created");

    Ok(Json(ApiResponse::with_data(
        "User created successfully",
        json!({ "user_id": user_id }),
    )))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    let fields = state
        .store
        .users()
        .get(&user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(ApiResponse::with_data(
        "User retrieved successfully",
        document_json(docstore::Document::new(user_id, fields)),
    )))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> ApiResult<Json<ApiResponse>> {
    let users = state.store.users();
    if users.get(&user_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    users.update(&user_id, to_fields(&payload, &[])?, Utc::now()).await?;

    Ok(Json(ApiResponse::with_data(
        "User updated successfully",
        json!({ "user_id": user_id }),
    )))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse>> {
    let users = state.store.users();
    if users.get(&user_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    users.delete(&user_id).await?;

    Ok(Json(ApiResponse::with_data(
        "User deleted successfully",
        json!({ "user_id": user_id }),
    )))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<ApiResponse>> {
    let users = state.store.users().list_all().await?;
    let count = users.len();

    Ok(Json(ApiResponse::with_data(
        format!("Retrieved {count} users"),
        json!({ "users": documents_json(users), "count": count }),
    )))
}
