//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request head:
//!     → access_control.rs (host allow-list, then IP block-list)
//!     → 403 envelope on rejection; body never read, hooks never run
//!     → otherwise pass to body buffering
//! ```
//!
//! # Design Decisions
//! - Evaluated before any body read
//! - Source IP prefers X-Forwarded-For over the peer address

pub mod access_control;

pub use access_control::{AccessDenied, AccessPolicy};
