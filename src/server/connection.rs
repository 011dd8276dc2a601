// Connection handling module
// Serves one accepted TCP (or TLS) connection with hyper's HTTP/1 server

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use super::ServerOptions;
use crate::handler::Dispatcher;
use crate::http::request::Request;
use crate::http::response::{build_413_response, build_text_response, ResponseBody};
use crate::logger::{self, AccessLogEntry};

/// Accept a connection and serve it in a spawned task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `dispatcher` - Frozen routing state shared by all connections
/// * `options` - Transport settings
/// * `acceptor` - TLS acceptor when serving HTTPS
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    dispatcher: &Arc<Dispatcher>,
    options: &Arc<ServerOptions>,
    acceptor: Option<&TlsAcceptor>,
) {
    logger::log_connection_accepted(&peer_addr);

    let dispatcher = Arc::clone(dispatcher);
    let options = Arc::clone(options);
    let acceptor = acceptor.cloned();

    tokio::spawn(async move {
        match acceptor {
            Some(acceptor) => match acceptor.accept(stream).await {
                Ok(tls_stream) => {
                    serve_connection(TokioIo::new(tls_stream), peer_addr, dispatcher, options)
                        .await;
                }
                Err(e) => logger::log_tls_handshake_failed(&peer_addr, &e),
            },
            None => serve_connection(TokioIo::new(stream), peer_addr, dispatcher, options).await,
        }
    });
}

/// Serve HTTP/1.1 on an established stream until the peer goes away or the
/// connection timeout expires.
async fn serve_connection<I>(
    io: I,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    options: Arc<ServerOptions>,
) where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let timeout = options.connection_timeout;
    let mut builder = http1::Builder::new();
    builder.keep_alive(options.keep_alive);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            let dispatcher = Arc::clone(&dispatcher);
            let options = Arc::clone(&options);
            async move {
                Ok::<_, Infallible>(handle_request(req, peer_addr, &dispatcher, &options).await)
            }
        }),
    );

    match timeout {
        Some(duration) => match tokio::time::timeout(duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {} seconds",
                duration.as_secs()
            )),
        },
        None => {
            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
        }
    }
}

/// Collect the body, dispatch, and write the access log line
async fn handle_request(
    req: hyper::Request<Incoming>,
    peer_addr: SocketAddr,
    dispatcher: &Dispatcher,
    options: &ServerOptions,
) -> Response<ResponseBody> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut entry = options.access_log.map(|_| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.referer = header_string(&parts.headers, REFERER);
        entry.user_agent = header_string(&parts.headers, USER_AGENT);
        entry
    });

    let response = match Limited::new(body, options.max_body_size).collect().await {
        Ok(collected) => {
            let request = Request::from_parts(parts, collected.to_bytes(), Some(peer_addr));
            dispatcher.dispatch(request).await
        }
        Err(e) => {
            let mut resp = if e.is::<http_body_util::LengthLimitError>() {
                logger::log_warning(&format!(
                    "Request body from {peer_addr} exceeds {} bytes",
                    options.max_body_size
                ));
                build_413_response()
            } else {
                logger::log_warning(&format!(
                    "Failed to read request body from {peer_addr}: {e}"
                ));
                build_text_response(StatusCode::BAD_REQUEST, "Bad Request")
            };
            dispatcher.apply_cors(resp.headers_mut());
            resp
        }
    };

    if let (Some(entry), Some(format)) = (entry.as_mut(), options.access_log) {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, format);
    }

    response
}

fn header_string(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
