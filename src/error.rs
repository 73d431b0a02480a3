//! Configuration-time errors raised to the embedding application.
//!
//! Request-time failures never use this type: the dispatcher turns them into
//! JSON envelope responses instead.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors returned by registration, startup and document generation.
#[derive(Debug, Error)]
pub enum TrestleError {
    /// A route could not be constructed (missing or malformed path).
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// Secure mode was requested without both a key and a certificate.
    #[error("secure mode requires both a TLS key and a TLS certificate")]
    MissingTlsMaterial,

    /// Strict OpenAPI generation found a route without a summary or responses.
    #[error("route [{method}] {path} is not OpenAPI compliant: a summary and at least one response are required")]
    SpecNotCompliant { method: String, path: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = TrestleError> = std::result::Result<T, E>;
