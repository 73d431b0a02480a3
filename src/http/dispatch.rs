//! The per-request pipeline.
//!
//! # Data Flow
//! ```text
//! Request
//!     → capture head (source IP, query, request ID)
//!     → access filter ── reject → 403
//!     → buffer body ───── over limit → 413, stream error → 400
//!     → OPTIONS ───────── 200 empty envelope
//!     → decode body
//!     → match route
//!     → hook chain ────── reject → 500 with hook code/message
//!     → miss: "/" and "/favicon.ico" → 200, otherwise → 404
//!     → route handler → its response
//! ```
//!
//! # Design Decisions
//! - Every exit point produces exactly one response; nothing escapes as an error
//! - Hooks see the match result, including misses
//! - CORS headers are added by the server layers, not here
//! - The request timeout covers the whole pipeline and answers `408` with an envelope

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;

use crate::hooks::{Hook, HookChain, HookContext};
use crate::http::body::decode_body;
use crate::http::request::{RequestInfo, RouteRequest};
use crate::http::response::{Envelope, Reply};
use crate::observability::metrics;
use crate::routing::{Route, RouteMatch, RouteRegistry};
use crate::security::AccessPolicy;

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const PAYLOAD_TOO_LARGE: &str = "Payload Too Large";
pub const BAD_REQUEST_BODY: &str = "Request body could not be read";
pub const REQUEST_TIMEOUT: &str = "Request Timeout";

/// Paths answered like a preflight when no route claims them.
const PREFLIGHT_PATHS: [&str; 2] = ["/", "/favicon.ico"];

/// Route label used in metrics when no route was selected.
const NO_ROUTE: &str = "none";

/// Owns the routes, hooks and access rules of one server instance.
#[derive(Debug)]
pub struct Dispatcher {
    registry: RouteRegistry,
    hooks: HookChain,
    access: AccessPolicy,
    max_body_size: usize,
    request_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(access: AccessPolicy, max_body_size: usize) -> Self {
        Self {
            registry: RouteRegistry::new(),
            hooks: HookChain::new(),
            access,
            max_body_size,
            request_timeout: None,
        }
    }

    /// Bound the whole pipeline, handler included. `None` waits forever.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn add_route(&mut self, route: Route) -> Arc<Route> {
        self.registry.register(route)
    }

    pub fn add_hook(&mut self, hook: impl Hook + 'static) {
        self.hooks.register(hook);
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    /// Run the full pipeline for one request, within the request timeout.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let Some(limit) = self.request_timeout else {
            return self.run_pipeline(request).await;
        };

        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request
            .headers()
            .get(crate::http::request::X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        match tokio::time::timeout(limit, self.run_pipeline(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    timeout_ms = limit.as_millis() as u64,
                    "Request timed out"
                );
                metrics::record_request(
                    method.as_str(),
                    StatusCode::REQUEST_TIMEOUT.as_u16(),
                    NO_ROUTE,
                    start,
                );
                Envelope::new(StatusCode::REQUEST_TIMEOUT)
                    .message(REQUEST_TIMEOUT)
                    .into_response()
            }
        }
    }

    async fn run_pipeline(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let info = Arc::new(RequestInfo::from_parts(&parts));

        tracing::debug!(
            request_id = info.request_id().unwrap_or("-"),
            method = %info.method(),
            path = %info.path(),
            source_ip = info.source_ip().unwrap_or("-"),
            "Request received"
        );

        if let Err(denied) = self.access.check(info.host(), info.source_ip()) {
            tracing::warn!(
                request_id = info.request_id().unwrap_or("-"),
                host = info.host().unwrap_or("-"),
                source_ip = info.source_ip().unwrap_or("-"),
                reason = %denied,
                "Request blocked"
            );
            metrics::record_blocked(denied.reason());
            let response = Envelope::new(StatusCode::FORBIDDEN)
                .message(denied.to_string())
                .into_response();
            return finish(&info, NO_ROUTE, start, response);
        }

        let bytes = match axum::body::to_bytes(body, self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    request_id = info.request_id().unwrap_or("-"),
                    limit = self.max_body_size,
                    error = %e,
                    "Request body rejected"
                );
                let envelope = if exceeds_limit(&e) {
                    Envelope::new(StatusCode::PAYLOAD_TOO_LARGE).message(PAYLOAD_TOO_LARGE)
                } else {
                    Envelope::new(StatusCode::BAD_REQUEST).message(BAD_REQUEST_BODY)
                };
                return finish(&info, NO_ROUTE, start, envelope.into_response());
            }
        };

        if *info.method() == Method::OPTIONS {
            return finish(&info, NO_ROUTE, start, Reply::ok().into_response());
        }

        let mut body = decode_body(&bytes, info.header(header::CONTENT_TYPE.as_str()));
        let route_match = self.registry.match_route(info.path(), info.method());

        let ctx = HookContext {
            route_match: route_match.clone(),
            request: Arc::clone(&info),
        };
        match self.hooks.run(ctx).await {
            Ok(data) => body.merge(data),
            Err(rejection) => {
                tracing::warn!(
                    request_id = info.request_id().unwrap_or("-"),
                    hook = rejection.index,
                    code = %rejection.code,
                    message = %rejection.message,
                    "Before-each-route hook failed"
                );
                metrics::record_hook_failure(&rejection.code);
                let route = route_match.route().map_or(NO_ROUTE, |r| r.path());
                let response = Envelope::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .message(rejection.message)
                    .code(rejection.code)
                    .into_response();
                return finish(&info, route, start, response);
            }
        }

        let (route, params) = match route_match {
            RouteMatch::Found { route, params } => (route, params),
            RouteMatch::Miss(reason) => {
                if PREFLIGHT_PATHS.contains(&info.path()) {
                    return finish(&info, NO_ROUTE, start, Reply::ok().into_response());
                }
                tracing::info!(
                    request_id = info.request_id().unwrap_or("-"),
                    method = %info.method(),
                    path = %info.path(),
                    reason = reason.as_str(),
                    "No route matched"
                );
                let response = Envelope::new(StatusCode::NOT_FOUND)
                    .message(ROUTE_NOT_FOUND)
                    .into_response();
                return finish(&info, NO_ROUTE, start, response);
            }
        };

        let request = RouteRequest {
            request: Arc::clone(&info),
            body,
            params,
            query: info.query().clone(),
        };
        let response = route.handle(request).await;
        finish(&info, route.path(), start, response)
    }
}

/// Whether a body buffering failure came from the size limit rather than the transport.
fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn finish(info: &RequestInfo, route: &str, start: Instant, response: Response) -> Response {
    let status = response.status();
    metrics::record_request(info.method().as_str(), status.as_u16(), route, start);
    tracing::debug!(
        request_id = info.request_id().unwrap_or("-"),
        status = status.as_u16(),
        route = route,
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}
