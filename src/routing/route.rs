//! Route definitions.
//!
//! A route is built once, registered, and never changes afterwards. It owns
//! exactly one handler which the dispatcher calls directly on a match.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::error::{Result, TrestleError};
use crate::http::request::RouteRequest;

/// A boxed async route handler.
pub type Handler = Arc<dyn Fn(RouteRequest) -> BoxFuture<'static, Response> + Send + Sync>;

/// One `/`-delimited piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// A `:name` placeholder; holds the name without the colon.
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(raw.to_string()),
        }
    }
}

/// Method and visibility options, as accepted from declarative route tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    /// HTTP method, defaults to `GET`.
    pub method: Option<String>,
    /// Visibility flag, defaults to `false`.
    pub public: Option<bool>,
}

/// OpenAPI metadata for a route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathSpec {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub responses: Option<BTreeMap<u16, String>>,
    pub tags: Option<Vec<String>>,
}

/// A registered (path pattern, method) pair with its handler and metadata.
pub struct Route {
    path: String,
    segments: Vec<Segment>,
    method: Method,
    public: bool,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    responses: BTreeMap<u16, String>,
    handler: Handler,
}

impl Route {
    /// Start building a route for the given path pattern.
    pub fn builder(path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(path)
    }

    pub fn get<F, Fut, R>(path: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::builder(path).method(Method::GET).build(handler)
    }

    pub fn post<F, Fut, R>(path: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::builder(path).method(Method::POST).build(handler)
    }

    pub fn put<F, Fut, R>(path: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::builder(path).method(Method::PUT).build(handler)
    }

    pub fn patch<F, Fut, R>(path: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::builder(path).method(Method::PATCH).build(handler)
    }

    pub fn delete<F, Fut, R>(path: impl Into<String>, handler: F) -> Result<Self>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::builder(path).method(Method::DELETE).build(handler)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pattern segments, excluding the empty segment before the leading `/`.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when at least one segment is a `:name` placeholder.
    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Informational visibility flag, read by hooks.
    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn responses(&self) -> &BTreeMap<u16, String> {
        &self.responses
    }

    /// Whether the route carries enough metadata for a compliant OpenAPI operation.
    pub fn is_spec_compatible(&self) -> bool {
        self.summary.is_some() && !self.responses.is_empty()
    }

    /// Invoke the route handler.
    pub fn handle(&self, request: RouteRequest) -> BoxFuture<'static, Response> {
        (self.handler)(request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("public", &self.public)
            .field("summary", &self.summary)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Route`].
#[derive(Debug)]
pub struct RouteBuilder {
    path: String,
    method: Method,
    invalid_method: Option<String>,
    public: bool,
    summary: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    responses: BTreeMap<u16, String>,
}

impl RouteBuilder {
    fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            invalid_method: None,
            public: false,
            summary: None,
            description: None,
            tags: Vec::new(),
            responses: BTreeMap::from([(200, "Success".to_string())]),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self.invalid_method = None;
        self
    }

    #[must_use]
    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the response descriptions (status code → description).
    #[must_use]
    pub fn responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(|(c, d)| (c, d.into())).collect();
        self
    }

    /// Apply declarative method/visibility options. Missing fields keep their defaults.
    #[must_use]
    pub fn options(mut self, options: RouteOptions) -> Self {
        if let Some(method) = options.method {
            // Case is preserved: matching is an exact comparison.
            match Method::from_bytes(method.as_bytes()) {
                Ok(m) => {
                    self.method = m;
                    self.invalid_method = None;
                }
                Err(_) => self.invalid_method = Some(method),
            }
        }
        if let Some(public) = options.public {
            self.public = public;
        }
        self
    }

    /// Apply OpenAPI metadata. Missing fields keep their defaults.
    #[must_use]
    pub fn spec(mut self, spec: PathSpec) -> Self {
        if let Some(summary) = spec.summary {
            self.summary = Some(summary);
        }
        if let Some(description) = spec.description {
            self.description = Some(description);
        }
        if let Some(responses) = spec.responses {
            self.responses = responses;
        }
        if let Some(tags) = spec.tags {
            self.tags = tags;
        }
        self
    }

    /// Finish the route with its handler.
    ///
    /// Fails with [`TrestleError::InvalidRoute`] when the path is empty or does
    /// not start with `/`, or when an options table named an unusable method.
    pub fn build<F, Fut, R>(self, handler: F) -> Result<Route>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        if self.path.is_empty() {
            return Err(TrestleError::InvalidRoute(
                "route 'path' is a required field".to_string(),
            ));
        }
        if !self.path.starts_with('/') {
            return Err(TrestleError::InvalidRoute(format!(
                "route path '{}' must start with '/'",
                self.path
            )));
        }
        if let Some(method) = self.invalid_method {
            return Err(TrestleError::InvalidRoute(format!(
                "route {} has an invalid method '{}'",
                self.path, method
            )));
        }

        let segments = self.path[1..].split('/').map(Segment::parse).collect();
        let handler: Handler = Arc::new(move |request| {
            let fut = handler(request);
            Box::pin(async move { fut.await.into_response() })
        });

        Ok(Route {
            path: self.path,
            segments,
            method: self.method,
            public: self.public,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            responses: self.responses,
            handler,
        })
    }
}
