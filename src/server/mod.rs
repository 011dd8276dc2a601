// Server module entry point
// Owns the accept loop, per-connection serving and shutdown

pub mod connection;
pub mod listener;
pub mod signal;
pub mod tls;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

use crate::handler::Dispatcher;
use crate::logger::{self, AccessLogFormat};

// Re-export commonly used types
pub use listener::create_reusable_listener;
pub use signal::shutdown_signal;
pub use tls::TlsOptions;

/// Transport settings applied to every connection
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Request bodies larger than this are answered with 413
    pub max_body_size: usize,
    pub keep_alive: bool,
    /// Upper bound on a connection's lifetime
    pub connection_timeout: Option<Duration>,
    /// Access log format, `None` disables the access log
    pub access_log: Option<AccessLogFormat>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024,
            keep_alive: true,
            connection_timeout: Some(Duration::from_secs(60)),
            access_log: Some(AccessLogFormat::Combined),
        }
    }
}

/// Handle to a running accept loop
///
/// Dropping the handle stops the accept loop without waiting for it.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    tls: bool,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The address the listener is bound to
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub const fn is_tls(&self) -> bool {
        self.tls
    }

    /// Stop accepting new connections and wait for the accept loop to exit.
    ///
    /// Connections already accepted finish in their own tasks.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                logger::log_error(&format!("Accept loop on {} failed: {e}", self.local_addr));
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}

/// Spawn the accept loop on `listener`.
///
/// # Arguments
///
/// * `listener` - Bound listener, owned by the loop until shutdown
/// * `dispatcher` - Routing state shared by every connection
/// * `options` - Transport settings
/// * `acceptor` - TLS acceptor when serving HTTPS
pub fn start(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: ServerOptions,
    acceptor: Option<TlsAcceptor>,
) -> std::io::Result<ServerHandle> {
    let local_addr = listener.local_addr()?;
    let shutdown = Arc::new(Notify::new());
    let tls = acceptor.is_some();

    let task = tokio::spawn(accept_loop(
        listener,
        dispatcher,
        Arc::new(options),
        acceptor,
        Arc::clone(&shutdown),
    ));

    Ok(ServerHandle {
        local_addr,
        tls,
        shutdown,
        task: Some(task),
    })
}

async fn accept_loop(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: Arc<ServerOptions>,
    acceptor: Option<TlsAcceptor>,
    shutdown: Arc<Notify>,
) {
    let local_addr = listener.local_addr().ok();
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &dispatcher,
                            &options,
                            acceptor.as_ref(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    if let Some(addr) = local_addr {
        logger::log_shutdown(&addr);
    }
}
