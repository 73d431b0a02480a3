//! TCP listener binding.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::error::Result;

/// Parse the configured bind address.
pub fn bind_address(config: &ListenerConfig) -> Result<SocketAddr> {
    config.bind_address.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address '{}': {e}", config.bind_address),
        )
        .into()
    })
}

/// Bind a plaintext listener on the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener> {
    let addr = bind_address(config)?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
