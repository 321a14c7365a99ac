//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::Error;

/// A crate [`Error`] rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// Status code for the wrapped error: 400 for client mistakes, 500 otherwise.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(kind = self.0.kind(), "request failed: {message}");
        } else {
            warn!(kind = self.0.kind(), "rejected request: {message}");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
