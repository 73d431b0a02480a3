//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request};
use axum::response::Response;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use trestle::{HttpServer, Shutdown};

/// Build a request with an optional body and content type.
pub fn request(method: Method, uri: &str, body: Option<(&str, &str)>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some((content_type, body)) => builder
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri, None)
}

/// Read a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve `server` on an ephemeral local port. Returns the bound address.
pub async fn spawn_server(server: HttpServer, shutdown: broadcast::Receiver<()>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}

/// Client without connection pooling or proxy settings.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn shutdown() -> Shutdown {
    Shutdown::new()
}
