use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::query::StoreError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("x-node-id header is required")]
    MissingNodeId,

    #[error("a query's submitter cannot respond to its own query")]
    SelfResponseForbidden,

    #[error("node was never assigned this query")]
    NotAssigned,

    #[error("node already responded to this query")]
    DuplicateResponse,

    #[error("query not found")]
    NotFound,

    #[error("not authorized to access this query")]
    Unauthorized,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Unauthorized => ApiError::Unauthorized,
            StoreError::SelfResponseForbidden => ApiError::SelfResponseForbidden,
            StoreError::NotAssigned => ApiError::NotAssigned,
            StoreError::Duplicate => ApiError::DuplicateResponse,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingNodeId => StatusCode::BAD_REQUEST,
            ApiError::SelfResponseForbidden => StatusCode::BAD_REQUEST,
            ApiError::NotAssigned => StatusCode::BAD_REQUEST,
            ApiError::DuplicateResponse => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
