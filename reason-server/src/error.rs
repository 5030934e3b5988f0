//! Error types for the server crate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reason_core::{DecodeError, ResourceError};

/// Errors that can occur while serving a resource request.
///
/// Clients only ever see the status code: not-found maps to `404`, every
/// other variant to `500` and is logged.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// An error returned by a resource handler capability.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The request form could not be decoded into the schema type.
    #[error("form decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The handler's result could not be serialized.
    #[error("failed to marshal resource to JSON: {0}")]
    Marshal(#[from] serde_json::Error),
}

impl ServerError {
    /// HTTP status written for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Resource(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status != StatusCode::NOT_FOUND {
            tracing::error!(error = %self, "unhandled error");
        }
        status.into_response()
    }
}

/// Errors raised while loading [`crate::config::ServerConfig`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A boolean setting had a value other than the accepted spellings.
    #[error("invalid value '{value}' for {name}: expected true/false, 1/0, yes/no or on/off")]
    InvalidFlag { name: &'static str, value: String },
}
