//! Error types for the `reason-core` crate.

use crate::schema::FieldKind;

/// Boxed error returned by resource handlers for anything other than
/// [`ResourceError::NotFound`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while reflecting over a schema type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// The type's JSON Schema does not describe a record with named fields.
    #[error("schema type '{type_name}' is not a record with named fields")]
    NotARecord { type_name: &'static str },

    /// The type's default value could not be serialized into a JSON object.
    #[error("default value of '{type_name}' could not be serialized: {source}")]
    DefaultValue {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors produced while decoding form values into a schema instance.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The schema type itself could not be described.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A form value could not be converted to the field's declared kind.
    #[error("invalid value '{value}' for field '{field}' ({kind}): {reason}")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
        reason: String,
    },

    /// The populated record was rejected when converting to the schema type.
    #[error("decoded form does not fit the schema type: {0}")]
    Convert(#[source] serde_json::Error),
}

/// Errors returned by resource handler capabilities.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// The requested resource does not exist. Maps to `404 Not Found`.
    #[error("resource not found")]
    NotFound,

    /// Any other handler failure. Maps to `500 Internal Server Error`.
    #[error(transparent)]
    Handler(BoxError),
}

impl ResourceError {
    /// Wrap an arbitrary handler error.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// Returns `true` for the not-found sentinel.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
