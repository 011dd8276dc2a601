//! TLS acceptor construction
//!
//! Certificates and keys are PEM, either given inline or read from files.

use crate::error::RouterError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_rustls::rustls;
use tokio_rustls::TlsAcceptor;

/// Certificate chain and private key for HTTPS
#[derive(Debug, Clone)]
pub enum TlsOptions {
    Pem { cert: Vec<u8>, key: Vec<u8> },
    Files { cert_path: PathBuf, key_path: PathBuf },
}

impl TlsOptions {
    pub fn from_pem(cert: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        Self::Pem {
            cert: cert.into(),
            key: key.into(),
        }
    }

    pub fn from_files(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self::Files {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// Build a TLS acceptor from these options
    pub fn build_acceptor(&self) -> Result<TlsAcceptor, RouterError> {
        match self {
            Self::Pem { cert, key } => build_acceptor(cert, key),
            Self::Files {
                cert_path,
                key_path,
            } => {
                let cert = std::fs::read(cert_path).map_err(|e| {
                    RouterError::Tls(format!(
                        "failed to read certificate file {}: {e}",
                        cert_path.display()
                    ))
                })?;
                let key = std::fs::read(key_path).map_err(|e| {
                    RouterError::Tls(format!(
                        "failed to read key file {}: {e}",
                        key_path.display()
                    ))
                })?;
                build_acceptor(&cert, &key)
            }
        }
    }
}

fn build_acceptor(cert_pem: &[u8], key_pem: &[u8]) -> Result<TlsAcceptor, RouterError> {
    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RouterError::Tls(format!("failed to parse certificates: {e}")))?;
    if certs.is_empty() {
        return Err(RouterError::Tls("no certificates found".to_string()));
    }

    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| RouterError::Tls(format!("failed to parse private key: {e}")))?
        .ok_or_else(|| RouterError::Tls("no private key found".to_string()))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| RouterError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| RouterError::Tls(format!("failed to build TLS config: {e}")))?;
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}
