//! Route storage and lookup.
//!
//! # Responsibilities
//! - Store registered routes in insertion order
//! - Look up the matching route for a request
//!
//! # Design Decisions
//! - Mutated only through `&mut self` before serving; shared read-only afterwards
//! - Duplicate (path, method) pairs are stored; the first registration wins on match

use std::sync::Arc;

use axum::http::Method;

use crate::routing::matcher::{self, RouteMatch};
use crate::routing::route::Route;

/// Ordered collection of routes.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Routes are valid by construction, so registration cannot fail.
    pub fn register(&mut self, route: Route) -> Arc<Route> {
        let duplicate = self
            .routes
            .iter()
            .any(|r| r.path() == route.path() && r.method() == route.method());
        if duplicate {
            tracing::warn!(
                method = %route.method(),
                path = %route.path(),
                "Duplicate route registered; the first registration keeps matching"
            );
        }

        tracing::info!(
            method = %route.method(),
            path = %route.path(),
            visibility = if route.is_public() { "public" } else { "private" },
            "Route added"
        );

        let route = Arc::new(route);
        self.routes.push(Arc::clone(&route));
        route
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Select at most one route for the request.
    pub fn match_route(&self, path: &str, method: &Method) -> RouteMatch {
        matcher::match_route(&self.routes, path, method)
    }
}
