//! Core types for the reason REST resource framework.
//!
//! Defines the capability traits a resource handler implements, the schema
//! reflection used to describe resource types, and the form decoder that
//! turns request values into typed records.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod capability;
pub mod error;
pub mod form;
pub mod schema;

pub use capability::{Capabilities, Creator, Deleter, Getter, Lister, ResourceHandler, Updater};
pub use error::{BoxError, DecodeError, ResourceError, SchemaError};
pub use form::{decode, parse_bool, FormValues};
pub use schema::{describe, FieldCache, FieldDescriptor, FieldKind, FloatWidth, IntWidth, Schema};
