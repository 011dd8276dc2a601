//! HTTP response building module
//!
//! Provides the shared body type and builders for the fixed plain-text
//! responses the dispatcher produces on its own.

use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::convert::Infallible;

/// Body type of every response produced by this crate
pub type ResponseBody = BoxBody<Bytes, std::io::Error>;

/// Wrap a fully buffered body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never: Infallible| match never {})
        .boxed()
}

/// An empty body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed()
}

/// Build a plain-text response with the given status
pub fn build_text_response(status: StatusCode, text: impl Into<String>) -> Response<ResponseBody> {
    let text = text.into();
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", text.len())
        .body(full(text.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status, text)
        })
}

/// Build 204 response for CORS preflight (headers are added by the caller)
pub fn build_204_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("204", &e);
            let mut resp = Response::new(empty());
            *resp.status_mut() = StatusCode::NO_CONTENT;
            resp
        })
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::FORBIDDEN, "Forbidden")
}

/// Build 404 response for an unmatched route
pub fn build_route_not_found() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "Route Not Found")
}

/// Build 404 response for a static lookup miss
pub fn build_file_not_found() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "File Not Found")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build 500 response carrying the failure detail
pub fn build_500_response(detail: &str) -> Response<ResponseBody> {
    build_text_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal Server Error: {detail}"),
    )
}

fn fallback(status: StatusCode, text: String) -> Response<ResponseBody> {
    let mut resp = Response::new(full(text));
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
