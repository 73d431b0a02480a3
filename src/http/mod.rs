//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, CORS headers, request ID, trace, timeout)
//!     → dispatch.rs (access filter, body, match, hooks, handler)
//!         → request.rs (request head, source IP, query)
//!         → body.rs (content-type decode)
//!     → response.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod body;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use body::DecodedBody;
pub use dispatch::Dispatcher;
pub use request::{RequestInfo, RouteRequest, X_REQUEST_ID};
pub use response::{Envelope, Reply, ResponseStatus};
pub use server::HttpServer;
