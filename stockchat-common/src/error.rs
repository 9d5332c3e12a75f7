//! Error types for stockchat services.
//!
//! Every failure that reaches the HTTP boundary is one of these variants and
//! renders as `{ "error": ..., "details"?: ... }`.

use thiserror::Error;

/// Result type alias using the stockchat error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for stockchat services.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (e.g. API credential not set)
    #[error("{0}")]
    Config(String),

    /// Blob store or LLM call failed
    #[error("{message}")]
    UpstreamFetch {
        message: String,
        details: Option<String>,
    },

    /// No matching record, symbol or snapshot
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Request body exceeds the accepted size
    #[error("Request body too large")]
    PayloadTooLarge,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Upstream failure without a body.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            message: message.into(),
            details: None,
        }
    }

    /// Upstream failure carrying the provider's error text.
    pub fn upstream_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Check if this is a not-found error.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Timeout => 408,
            Self::PayloadTooLarge => 413,
            _ => 500,
        }
    }

    /// Optional details attached to the error body.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::UpstreamFetch { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// JSON body of the error response.
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = serde_json::Value::String(details.to_string());
        }
        body
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, axum::Json(self.to_body())).into_response()
    }
}
