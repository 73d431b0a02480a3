//! Trestle: a small HTTP API framework on Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net (TCP / TLS) ──▶ http::server (CORS, request ID, trace, timeout)
//!                                                │
//!                                                ▼
//!                                         http::dispatch
//!                     ┌──────────────────────────┼──────────────────────────┐
//!                     ▼                          ▼                          ▼
//!              security (host/IP)     routing (registry + matcher)    hooks (beforeEachRoute)
//!                                                │
//!                                                ▼
//!                                        route handler ──▶ http::response (JSON envelope)
//!
//!     openapi: routes ──▶ OpenAPI 3.0 document
//!     Cross-cutting: config, observability, lifecycle
//! ```
//!
//! # Example
//!
//! ```no_run
//! use trestle::{HttpServer, Reply, Route, RouteRequest, ServerConfig, Shutdown};
//!
//! # async fn demo() -> trestle::Result<()> {
//! let mut server = HttpServer::new(ServerConfig::default());
//! server.add_route(Route::get("/users/:id", |req: RouteRequest| async move {
//!     Reply::json(serde_json::json!({ "id": req.param("id") }))
//! })?);
//!
//! let shutdown = Shutdown::new();
//! server.serve(shutdown.subscribe()).await
//! # }
//! ```

// Core subsystems
pub mod config;
pub mod hooks;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod openapi;
pub mod security;

pub use config::schema::ServerConfig;
pub use error::{Result, TrestleError};
pub use hooks::{Hook, HookContext, HookOutcome, RequireAuthorization};
pub use http::{Envelope, HttpServer, Reply, RouteRequest};
pub use lifecycle::Shutdown;
pub use net::TlsMaterial;
pub use routing::{Route, RouteMatch};
