// src/api/error.rs
// Maps `SearchError` onto HTTP responses. Grounded in the teacher's
// `api/http/auth.rs::AuthError` (an `IntoResponse` impl next to the error
// enum it serves) generalized to the service's own error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::SearchError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    details: Option<String>,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            SearchError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            SearchError::DependencyUnready(_) => (StatusCode::SERVICE_UNAVAILABLE, "dependency_unready"),
            SearchError::DependencyTransient(_) => (StatusCode::SERVICE_UNAVAILABLE, "dependency_transient"),
            SearchError::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "timeout"),
            SearchError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "unhandled internal error reached the HTTP boundary");
        }

        let body = ErrorBody {
            code,
            message: self.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}
