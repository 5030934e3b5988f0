//! Response writing for resource results.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ServerError;

/// Serialize `resource` (a record or a list of records) as the JSON body.
///
/// Serialization happens before any byte is written, so a failure becomes a
/// plain `500` instead of a truncated body.
///
/// # Errors
/// Returns [`ServerError::Marshal`] if serialization fails.
pub fn write_resource<T: Serialize + ?Sized>(
    status: StatusCode,
    resource: &T,
) -> Result<Response, ServerError> {
    let body = serde_json::to_vec(resource)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}

/// A status-only response.
#[must_use]
pub fn write_empty(status: StatusCode) -> Response {
    status.into_response()
}
