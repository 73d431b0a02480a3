//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Collect routes and hooks before serving
//! - Create the Axum Router: one fallback handler feeding the dispatcher
//! - Wire up middleware (CORS headers, request ID, tracing)
//! - Serve plaintext or TLS with graceful shutdown
//!
//! # Design Decisions
//! - Registration takes `&mut self`; once turned into a router the route and
//!   hook lists are frozen behind an `Arc`
//! - Axum's own router is not used for matching

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::{Result, TrestleError};
use crate::hooks::Hook;
use crate::http::dispatch::Dispatcher;
use crate::http::request::RequestUuid;
use crate::lifecycle::shutdown;
use crate::net::{listener, TlsMaterial};
use crate::openapi::{self, OpenApiDocument, SpecInfo};
use crate::routing::Route;
use crate::security::AccessPolicy;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_HEADERS: &str = "jax-client-token, authorization, content-type";
pub const CORS_ALLOW_METHODS: &str = "GET";
pub const CORS_MAX_AGE: &str = "-1";

/// How long in-flight TLS connections may drain after shutdown.
const TLS_DRAIN_GRACE: Duration = Duration::from_secs(30);

/// An API server: routes, hooks and access rules bound to one config.
#[derive(Debug)]
pub struct HttpServer {
    config: ServerConfig,
    dispatcher: Dispatcher,
    tls: Option<TlsMaterial>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        // `0` disables the timeout.
        let request_timeout = Some(config.timeouts.request_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let dispatcher = Dispatcher::new(
            AccessPolicy::from_config(&config.access),
            config.listener.max_body_size,
        )
        .with_request_timeout(request_timeout);
        Self {
            config,
            dispatcher,
            tls: None,
        }
    }

    pub fn add_route(&mut self, route: Route) -> &mut Self {
        self.dispatcher.add_route(route);
        self
    }

    /// Register a hook run before every non-preflight request.
    pub fn before_each_route(&mut self, hook: impl Hook + 'static) -> &mut Self {
        self.dispatcher.add_hook(hook);
        self
    }

    /// TLS material for secure mode; takes precedence over configured paths.
    pub fn set_tls(&mut self, material: TlsMaterial) -> &mut Self {
        self.tls = Some(material);
        self
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        self.dispatcher.registry().routes()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// OpenAPI document for the registered routes, honouring `openapi.strict`.
    pub fn openapi(&self) -> Result<OpenApiDocument> {
        openapi::generate(self.routes(), &SpecInfo::from_config(&self.config))
    }

    /// Freeze registration and build the layered router.
    pub fn into_router(self) -> Router {
        build_router(Arc::new(self.dispatcher))
    }

    /// Serve plaintext HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.dispatcher.registry().len(),
            hooks = self.dispatcher.hooks().len(),
            "HTTP server starting"
        );

        let app = self
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Bind from config and serve, over TLS when `listener.secure` is set.
    ///
    /// Secure mode without TLS material fails with
    /// [`TrestleError::MissingTlsMaterial`] before anything is bound.
    pub async fn serve(mut self, shutdown: broadcast::Receiver<()>) -> Result<()> {
        if !self.config.listener.secure {
            let listener = listener::bind(&self.config.listener).await?;
            return self.run(listener, shutdown).await;
        }

        let material = match self.tls.take() {
            Some(material) => material,
            None => match &self.config.listener.tls {
                Some(paths) => {
                    TlsMaterial::from_pem_files(Path::new(&paths.key_path), Path::new(&paths.cert_path))
                        .await?
                }
                None => return Err(TrestleError::MissingTlsMaterial),
            },
        };
        let rustls_config = material.into_rustls_config().await?;
        let addr = listener::bind_address(&self.config.listener)?;

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(TLS_DRAIN_GRACE));
        });

        tracing::info!(
            address = %addr,
            routes = self.dispatcher.registry().len(),
            hooks = self.dispatcher.hooks().len(),
            "HTTPS server starting"
        );

        let app = self
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, rustls_config)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

async fn dispatch_request(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    dispatcher.dispatch(request).await
}

/// Build the Axum router with all middleware layers.
fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .fallback(dispatch_request)
        .with_state(dispatcher)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(RequestUuid))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(CORS_ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(CORS_ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(CORS_MAX_AGE),
        ))
}
