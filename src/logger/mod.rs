//! Logger module
//!
//! Named logging helpers over `tracing`, covering:
//! - Router setup (routes, static root)
//! - Server lifecycle (listen, bind failures, shutdown)
//! - Access logging in several formats
//! - Error and warning logging

mod format;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::LoggingConfig;
use crate::error::HandlerError;
use hyper::Method;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless; later calls keep the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_err()
    {
        tracing::debug!("logger already initialized");
    }
}

pub fn log_server_start(addr: &SocketAddr, tls: bool) {
    let scheme = if tls { "https" } else { "http" };
    tracing::info!("======================================");
    tracing::info!("Server started successfully");
    tracing::info!("Listening on: {scheme}://{addr}");
    tracing::info!("======================================");
}

pub fn log_route_registered(method: &Method, pattern: &str) {
    tracing::debug!("[Route] {method} {pattern}");
}

pub fn log_static_root(root: &Path) {
    tracing::info!("[Static] Serving files from {}", root.display());
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::trace!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_tls_handshake_failed(peer_addr: &SocketAddr, err: &std::io::Error) {
    tracing::warn!("[TLS] Handshake with {peer_addr} failed: {err}");
}

pub fn log_handler_failure(pattern: &str, err: &HandlerError) {
    tracing::error!("[Handler] '{pattern}' failed: {err}");
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_error(&format!("Failed to bind {addr}: {err}"));
}

pub fn log_shutdown(addr: &SocketAddr) {
    tracing::info!("[Shutdown] Listener on {addr} closed, open connections finish on their own");
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}

pub fn log_debug(message: &str) {
    tracing::debug!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
