//! OpenAPI document generation.
//!
//! # Data Flow
//! ```text
//! RouteRegistry (registration order)
//!     → generator.rs (strict check, path templating, one operation per route)
//!     → document.rs (serde model)
//!     → to_json
//! ```

pub mod document;
pub mod generator;

pub use document::OpenApiDocument;
pub use generator::{generate, openapi_path, SpecInfo};
