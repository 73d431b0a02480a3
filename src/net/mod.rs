//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Plaintext: listener.rs (bind) → axum::serve
//! Secure:    tls.rs (material → rustls config) → axum_server::bind_rustls
//! ```
//!
//! # Design Decisions
//! - TLS is optional and chosen by config
//! - Missing TLS material aborts startup

pub mod listener;
pub mod tls;

pub use tls::TlsMaterial;
