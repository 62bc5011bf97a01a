//! Gateway error types with wire code mapping.
//!
//! [`GatewayError`] is the central error type. Each variant maps to a
//! numeric code used in WebSocket `error` envelopes and to an HTTP status
//! for the REST endpoints. [`PushError`] covers the outbound send path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body for REST endpoints.
///
/// ```json
/// {
///   "error": {
///     "code": 401,
///     "message": "missing or invalid ingest token"
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
///
/// Also the payload of WebSocket `error` envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum.
///
/// # Error Codes
///
/// | Code | Meaning                          | HTTP Status               |
/// |------|----------------------------------|---------------------------|
/// | 400  | Bad call or argument             | 400 Bad Request           |
/// | 401  | Missing credentials (REST)       | 401 Unauthorized          |
/// | 403  | Command needs a session          | 403 Forbidden             |
/// | 3000 | Internal                         | 500 Internal Server Error |
/// | 3002 | Configuration                    | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Restricted command from an unauthenticated connection, or failed login.
    #[error("Forbidden")]
    Forbidden,

    /// Missing or invalid REST credentials.
    #[error("missing or invalid ingest token")]
    Unauthorized,

    /// Malformed call or argument.
    #[error("{0}")]
    InvalidRequest(String),

    /// Event filter pattern failed to compile.
    #[error("invalid event pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) | Self::InvalidPattern(_) => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::Internal(_) => 3000,
            Self::Config(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wire form of this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_body(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

/// Failure while pushing a frame to a client.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The frame's payload has no JSON representation.
    #[error("payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    /// The peer went away.
    #[error("connection closed")]
    Closed,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}
