//! Before-each-route hooks.
//!
//! # Data Flow
//! ```text
//! Request (not OPTIONS), after body decode and route match
//!     → chain.rs (all hooks launched concurrently, all awaited)
//!     → any resolve == false → first rejection (registration order) → 500
//!     → otherwise hook data merged into the body (registration order)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Hooks belong to one server instance, never to the process
//! - Registered at startup only; the list is read-only while serving
//! - Deterministic aggregation regardless of which hook settles first

pub mod chain;
pub mod guards;

pub use chain::{Hook, HookChain, HookContext, HookOutcome, HookRejection};
pub use guards::RequireAuthorization;
