//! Error types
//!
//! Registration, lifecycle and response errors are plain `thiserror` enums.
//! Handler failures are carried by the opaque [`HandlerError`].

use std::error::Error as StdError;
use std::fmt;
use std::net::SocketAddr;

/// Errors surfaced by route registration and the server lifecycle
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("server is not listening")]
    NotListening,

    #[error("server is already listening on {0}")]
    AlreadyListening(SocketAddr),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Mime(#[from] MimeError),
}

/// Errors from the per-instance MIME table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MimeError {
    #[error("extension must not be empty")]
    EmptyExtension,

    #[error("MIME type must not be empty")]
    EmptyMimeType,
}

/// Errors returned by the response writer finalizers
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response has already been sent")]
    AlreadySent,

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure raised by a request handler.
///
/// Anything convertible into a boxed error can be turned into a `HandlerError`,
/// so handlers can use `?` on I/O errors, response errors or plain strings.
pub struct HandlerError(Box<dyn StdError + Send + Sync>);

impl HandlerError {
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(err.into())
    }

    /// Build an error for a handler task that panicked
    pub(crate) fn panicked(detail: &str) -> Self {
        Self(format!("handler panicked: {detail}").into())
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.0
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
