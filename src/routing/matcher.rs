//! Route matching logic.
//!
//! # Responsibilities
//! - Select at most one route for a (path, method) pair
//! - Extract `:name` path parameters positionally
//!
//! # Design Decisions
//! - Method comparison is exact and case-sensitive
//! - Exact path match always wins over a parameterized match
//! - Parameterized candidates must have the same segment count as the path
//! - Among parameterized candidates, first registered wins (no specificity ranking)
//! - No normalization: `/a/` and `/a` are different paths

use std::sync::Arc;

use axum::http::Method;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::routing::route::{Route, Segment};

/// Path parameters in left-to-right pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

static NO_PARAMS: PathParams = PathParams(Vec::new());

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`; a repeated name keeps its first position but takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for PathParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Why no route was selected. Both reasons surface as a 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No route is registered for the request method at all.
    NoRouteForMethod,
    /// Routes exist for the method but none matches the path.
    NoMatchingPath,
}

impl MissReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::NoRouteForMethod => "no_route_for_method",
            MissReason::NoMatchingPath => "no_matching_path",
        }
    }
}

/// Result of matching a request against the registry.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    Found { route: Arc<Route>, params: PathParams },
    Miss(MissReason),
}

impl RouteMatch {
    pub fn route(&self) -> Option<&Arc<Route>> {
        match self {
            RouteMatch::Found { route, .. } => Some(route),
            RouteMatch::Miss(_) => None,
        }
    }

    /// Extracted parameters; empty for exact matches and misses.
    pub fn params(&self) -> &PathParams {
        match self {
            RouteMatch::Found { params, .. } => params,
            RouteMatch::Miss(_) => &NO_PARAMS,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found { .. })
    }
}

/// Split a request path into segments, dropping the empty segment before the leading `/`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// Select a route for `path` and `method` from `routes`, in registration order.
pub fn match_route(routes: &[Arc<Route>], path: &str, method: &Method) -> RouteMatch {
    let with_method: Vec<&Arc<Route>> = routes.iter().filter(|r| r.method() == method).collect();
    if with_method.is_empty() {
        return RouteMatch::Miss(MissReason::NoRouteForMethod);
    }

    if let Some(route) = with_method.iter().find(|r| r.path() == path) {
        return RouteMatch::Found {
            route: Arc::clone(*route),
            params: PathParams::new(),
        };
    }

    let request_segments = split_path(path);
    let candidate = with_method
        .into_iter()
        .filter(|r| r.segments().len() == request_segments.len())
        .filter(|r| r.has_params())
        .find(|r| wildcard_equal(r.segments(), &request_segments));

    match candidate {
        Some(route) => {
            let mut params = PathParams::new();
            for (segment, value) in route.segments().iter().zip(&request_segments) {
                if let Segment::Param(name) = segment {
                    params.insert(name.as_str(), *value);
                }
            }
            RouteMatch::Found {
                route: Arc::clone(route),
                params,
            }
        }
        None => RouteMatch::Miss(MissReason::NoMatchingPath),
    }
}

/// Compare a pattern and a path with every parameter position treated as `*`.
fn wildcard_equal(pattern: &[Segment], path: &[&str]) -> bool {
    pattern.iter().zip(path).all(|(segment, value)| match segment {
        Segment::Param(_) => true,
        Segment::Literal(literal) => literal == value,
    })
}
