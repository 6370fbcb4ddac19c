use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docstore::StoreError;
use serde_json::json;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a request handler, rendered as `{"success": false, "message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An existence check failed. Carries the resource label, e.g. `User`.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error kind attached to failed responses for the metrics middleware.
#[derive(Debug, Clone, Copy)]
pub struct ErrorKind(pub &'static str);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(e) => match e {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::NotInitialized { .. } | StoreError::StoreUnavailable { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                StoreError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Store(e) => e.kind(),
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "invalid_argument",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(kind = self.kind(), %message, "Request failed");
        } else {
            warn!(kind = self.kind(), %message, "Request rejected");
        }

        let mut response = (status, Json(json!({ "success": false, "message": message }))).into_response();
        response.extensions_mut().insert(ErrorKind(self.kind()));
        response
    }
}
