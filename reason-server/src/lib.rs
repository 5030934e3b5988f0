//! HTTP server for the reason REST resource framework.
//!
//! Turns resource handlers into axum routes, decodes form input for write
//! operations and writes handler results as JSON.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod demo;
pub mod error;
pub mod redirect;
pub mod routes;
pub mod store;
pub mod writer;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use routes::{RequestForm, Server};
pub use store::{MemoryStore, Record};
