use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything that can fail while serving a dashboard request.
///
/// All three variants are caught at the request boundary and turned into a
/// JSON error response; none of them crash the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or unreadable service-account credentials. Fatal to the
    /// triggering request, user-correctable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The Sheets API call itself failed (network, auth, decode).
    #[error("upstream fetch failed: {0}")]
    Fetch(String),

    /// A malformed query parameter supplied by the client.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Single translation point from errors to HTTP responses; route handlers
// just return Result<_, AppError> and use `?`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed: {}", self);
        } else {
            log::debug!("rejected request: {}", self);
        }
        let body = Json(serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
