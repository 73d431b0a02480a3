//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Capture the request head once, shared by hooks and the handler
//! - Resolve the source IP (forwarded-for first, then the peer address)
//! - Parse the query string
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The head is captured before the body is read; the body travels separately

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ConnectInfo,
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::body::DecodedBody;
use crate::routing::PathParams;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Decoded query string; on duplicate keys the last value wins.
pub type QueryMap = BTreeMap<String, String>;

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request head as seen by hooks and handlers.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    source_ip: Option<String>,
    request_id: Option<String>,
    query: QueryMap,
}

impl RequestInfo {
    /// Capture the head of an incoming request.
    pub fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            source_ip: resolve_source_ip(&parts.headers, peer),
            request_id: header_str(&parts.headers, X_REQUEST_ID).map(str::to_string),
            query: parse_query(parts.uri.query()),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Declared host: the `Host` header, or the URI authority for HTTP/2.
    pub fn host(&self) -> Option<&str> {
        header_str(&self.headers, header::HOST.as_str())
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn query(&self) -> &QueryMap {
        &self.query
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Source IP: first `X-Forwarded-For` entry when present, else the peer address.
pub fn resolve_source_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => peer.map(|addr| addr.ip().to_canonical().to_string()),
    }
}

pub fn parse_query(query: Option<&str>) -> QueryMap {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Everything a route handler receives.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// The request head, shared with the hooks that ran before the handler.
    pub request: Arc<RequestInfo>,
    /// Decoded body with hook data merged in.
    pub body: DecodedBody,
    pub params: PathParams,
    pub query: QueryMap,
}

impl RouteRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}
