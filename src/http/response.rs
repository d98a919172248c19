//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Build JSON and empty responses for handlers
//! - Map domain errors to HTTP status codes with a JSON `message` body
//!
//! # Design Decisions
//! - Unknown table and unknown record both surface as 404 "Task not found";
//!   the distinction is logged by the store, not exposed
//! - Persistence failures are 500s: a mutation is only acknowledged once
//!   it is on disk

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Task not found")]
    NotFound,

    #[error("Failed to persist changes")]
    Persistence,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound
        } else {
            ApiError::Persistence
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// A JSON body with the given status.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    (status, Json(value)).into_response()
}

/// `204 No Content` with an empty body.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn message(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_error_responses() {
        let response = ApiError::Validation("Title and description are required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(message(response).await, "Title and description are required");

        let response = ApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(message(response).await, "Task not found");
    }

    #[test]
    fn test_store_error_mapping() {
        let table = ApiError::from(StoreError::TableNotFound("tasks".into()));
        let record = ApiError::from(StoreError::RecordNotFound {
            table: "tasks".into(),
            id: Uuid::new_v4(),
        });
        assert_eq!(table.status(), StatusCode::NOT_FOUND);
        assert_eq!(record.status(), StatusCode::NOT_FOUND);
        assert_eq!(table.to_string(), record.to_string());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let persist = ApiError::from(StoreError::Persistence(io));
        assert_eq!(persist.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(StoreError::WriterClosed).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_no_content() {
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }
}
