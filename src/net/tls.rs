//! TLS key and certificate material.
//!
//! # Responsibilities
//! - Hold PEM key/certificate bytes supplied by the embedding application
//! - Load them from disk when configured by path
//! - Validate the PEM before it reaches rustls
//!
//! # Design Decisions
//! - Both parts must be non-empty; a half-configured secure listener never starts
//! - Validation happens at startup so bad material fails fast

use std::fmt;
use std::io::{self, BufReader};
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::error::{Result, TrestleError};

/// PEM-encoded private key and certificate chain.
#[derive(Clone)]
pub struct TlsMaterial {
    key: Vec<u8>,
    cert: Vec<u8>,
}

impl TlsMaterial {
    /// Fails with [`TrestleError::MissingTlsMaterial`] when either part is empty.
    pub fn new(key: impl Into<Vec<u8>>, cert: impl Into<Vec<u8>>) -> Result<Self> {
        let key = key.into();
        let cert = cert.into();
        if key.is_empty() || cert.is_empty() {
            return Err(TrestleError::MissingTlsMaterial);
        }
        Ok(Self { key, cert })
    }

    /// Read the key and certificate files.
    pub async fn from_pem_files(key_path: &Path, cert_path: &Path) -> Result<Self> {
        let key = tokio::fs::read(key_path).await.map_err(|e| {
            tracing::error!(path = %key_path.display(), error = %e, "Failed to read TLS key");
            e
        })?;
        let cert = tokio::fs::read(cert_path).await.map_err(|e| {
            tracing::error!(path = %cert_path.display(), error = %e, "Failed to read TLS certificate");
            e
        })?;
        Self::new(key, cert)
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn cert(&self) -> &[u8] {
        &self.cert
    }

    /// Check that the certificate PEM holds at least one certificate and the
    /// key PEM holds a private key.
    pub fn validate(&self) -> Result<()> {
        let certs = rustls_pemfile::certs(&mut BufReader::new(self.cert.as_slice()))
            .collect::<io::Result<Vec<_>>>()?;
        if certs.is_empty() {
            return Err(invalid_data("no certificate found in PEM input").into());
        }

        match rustls_pemfile::private_key(&mut BufReader::new(self.key.as_slice()))? {
            Some(_) => Ok(()),
            None => Err(invalid_data("no private key found in PEM input").into()),
        }
    }

    /// Validate and convert into the rustls config used by the TLS listener.
    pub async fn into_rustls_config(self) -> Result<RustlsConfig> {
        self.validate()?;
        Ok(RustlsConfig::from_pem(self.cert, self.key).await?)
    }
}

fn invalid_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("cert", &format_args!("<{} bytes>", self.cert.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_parts_rejected() {
        assert!(matches!(
            TlsMaterial::new(Vec::new(), b"cert".to_vec()),
            Err(TrestleError::MissingTlsMaterial)
        ));
        assert!(matches!(
            TlsMaterial::new(b"key".to_vec(), Vec::new()),
            Err(TrestleError::MissingTlsMaterial)
        ));
    }

    #[test]
    fn test_non_pem_input_fails_validation() {
        let material = TlsMaterial::new(b"not a key".to_vec(), b"not a cert".to_vec()).unwrap();
        assert!(matches!(material.validate(), Err(TrestleError::Io(_))));
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let material = TlsMaterial::new(b"secret".to_vec(), b"cert".to_vec()).unwrap();
        let rendered = format!("{material:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<6 bytes>"));
    }

    #[tokio::test]
    async fn test_missing_files() {
        let result = TlsMaterial::from_pem_files(
            Path::new("/nonexistent/key.pem"),
            Path::new("/nonexistent/cert.pem"),
        )
        .await;
        assert!(matches!(result, Err(TrestleError::Io(_))));
    }
}
