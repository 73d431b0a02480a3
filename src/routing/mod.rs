//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     Route::builder(path) → build(handler)
//!     → registry.rs (ordered, duplicates kept)
//!
//! Incoming Request (method, path)
//!     → registry.rs (route lookup)
//!     → matcher.rs (method filter → exact → same-length :param candidates)
//!     → Return: RouteMatch::Found { route, params } or RouteMatch::Miss
//! ```
//!
//! # Design Decisions
//! - Routes immutable after construction, registry read-only while serving
//! - No regex: literal segment comparison only
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod registry;
pub mod route;

pub use matcher::{MissReason, PathParams, RouteMatch};
pub use registry::RouteRegistry;
pub use route::{Handler, PathSpec, Route, RouteBuilder, RouteOptions, Segment};
