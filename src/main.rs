//! `trestle` command-line entry point.
//!
//! `serve` runs a small demo API behind the configured stack; `openapi`
//! prints the OpenAPI document for the same routes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use trestle::config::{load_config, ServerConfig};
use trestle::lifecycle::signals::spawn_signal_handler;
use trestle::observability::{init_logging, init_metrics};
use trestle::{HttpServer, Reply, RequireAuthorization, Route, RouteRequest, Shutdown};

#[derive(Parser)]
#[command(name = "trestle")]
#[command(about = "Minimal HTTP API server with an OpenAPI generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo API
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the OpenAPI document as JSON
    Openapi {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail when a route lacks a summary or responses
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let config = load(config)?;
            init_logging(&config.observability);
            tracing::info!("trestle v{} starting", env!("CARGO_PKG_VERSION"));

            tracing::info!(
                bind_address = %config.listener.bind_address,
                secure = config.listener.secure,
                request_timeout_secs = config.timeouts.request_secs,
                "Configuration loaded"
            );

            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let shutdown = Arc::new(Shutdown::new());
            let server_shutdown = shutdown.subscribe();
            spawn_signal_handler(Arc::clone(&shutdown));

            demo_server(config)?.serve(server_shutdown).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Openapi { config, strict } => {
            let mut config = load(config)?;
            config.openapi.strict |= strict;
            let document = demo_server(config)?.openapi()?;
            println!("{}", document.to_json()?);
        }
    }

    Ok(())
}

fn load(path: Option<PathBuf>) -> Result<ServerConfig, trestle::config::ConfigError> {
    match path {
        Some(path) => load_config(&path),
        None => Ok(ServerConfig::default()),
    }
}

fn demo_server(config: ServerConfig) -> trestle::Result<HttpServer> {
    let mut server = HttpServer::new(config);

    server
        .before_each_route(RequireAuthorization::new())
        .add_route(
            Route::builder("/hello/world")
                .public(true)
                .summary("Greeting")
                .tags(["demo"])
                .build(|_req: RouteRequest| async { Reply::json(json!({ "hello": "world" })) })?,
        )
        .add_route(
            Route::builder("/push/test")
                .method(axum::http::Method::POST)
                .public(true)
                .summary("Echo the decoded request body")
                .tags(["demo"])
                .responses([(200, "The body as received, plus hook data")])
                .build(|req: RouteRequest| async move { Reply::json(req.body) })?,
        )
        .add_route(
            Route::builder("/users/:id")
                .summary("Fetch a user")
                .description("Requires an Authorization or jax-client-token header.")
                .tags(["users"])
                .responses([(200, "The user"), (500, "Missing credentials")])
                .build(|req: RouteRequest| async move {
                    Reply::json(json!({
                        "id": req.param("id"),
                        "verbose": req.query_param("verbose").is_some(),
                    }))
                })?,
        );

    Ok(server)
}
