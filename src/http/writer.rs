//! Response writer handed to route handlers
//!
//! Buffers status and headers until one of the finalizers (`json`, `send`,
//! `end`) commits them. After that the writer is "sent": status and header
//! mutations are silently ignored and further finalizers fail.

use crate::error::ResponseError;
use crate::http::mime::{MimeTypes, DEFAULT_MIME_TYPE};
use crate::http::response::{empty, full, ResponseBody};
use crate::logger;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

/// Body accepted by [`ResponseWriter::send`]
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent as `text/plain`
    Text(String),
    /// Content type sniffed from magic bytes, else `application/octet-stream`
    Binary(Bytes),
    /// Serialized and sent as `application/json`
    Json(serde_json::Value),
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(b))
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(b))
    }
}

impl From<serde_json::Value> for Payload {
    /// Objects and arrays become JSON, strings are sent as-is and every
    /// other value is stringified as plain text
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => Self::Json(value),
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Chainable wrapper around the outbound response
#[derive(Debug)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Bytes>,
    headers_sent: bool,
    mime: Arc<MimeTypes>,
}

impl ResponseWriter {
    pub fn new(mime: Arc<MimeTypes>) -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: None,
            headers_sent: false,
            mime,
        }
    }

    /// Buffer the status code; ignored once headers are sent
    pub fn status(&mut self, code: u16) -> &mut Self {
        if self.headers_sent {
            return self;
        }
        match StatusCode::from_u16(code) {
            Ok(status) => self.status = Some(status),
            Err(_) => logger::log_warning(&format!("Ignoring invalid status code {code}")),
        }
        self
    }

    /// Set (replace) a header; ignored once headers are sent
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        if self.headers_sent {
            return self;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Ignoring invalid header '{name}: {value}'")),
        }
        self
    }

    /// Bulk form of [`set`](Self::set)
    pub fn set_all<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self.set(name.as_ref(), value.as_ref());
        }
        self
    }

    /// Set Content-Type from a file extension
    pub fn content_type(&mut self, extension: &str) -> &mut Self {
        let mime = self
            .mime
            .type_for_extension(extension)
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        self.set(CONTENT_TYPE.as_str(), &mime)
    }

    /// Serialize `data` and send it as `application/json`
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), ResponseError> {
        if self.headers_sent {
            return Err(ResponseError::AlreadySent);
        }
        let body = serde_json::to_vec(data)?;
        self.finalize("application/json", Bytes::from(body));
        Ok(())
    }

    /// Send a text, binary or JSON payload
    pub fn send(&mut self, data: impl Into<Payload>) -> Result<(), ResponseError> {
        if self.headers_sent {
            return Err(ResponseError::AlreadySent);
        }
        match data.into() {
            Payload::Text(text) => self.finalize("text/plain", Bytes::from(text)),
            Payload::Binary(bytes) => {
                let mime = self
                    .mime
                    .type_for_buffer(&bytes)
                    .unwrap_or(DEFAULT_MIME_TYPE);
                self.finalize(mime, bytes);
            }
            Payload::Json(value) => return self.json(&value),
        }
        Ok(())
    }

    /// Finish with the buffered status (or 200) and no body
    pub fn end(&mut self) -> Result<(), ResponseError> {
        if self.headers_sent {
            return Err(ResponseError::AlreadySent);
        }
        self.headers_sent = true;
        Ok(())
    }

    pub const fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Append headers ahead of the handler, which may still replace them
    pub(crate) fn seed_headers(&mut self, headers: &HeaderMap) {
        for (name, value) in headers {
            self.headers.append(name, value.clone());
        }
    }

    fn finalize(&mut self, default_type: &str, body: Bytes) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            if let Ok(value) = HeaderValue::from_str(default_type) {
                self.headers.insert(CONTENT_TYPE, value);
            }
        }
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.body = Some(body);
        self.headers_sent = true;
    }

    /// Convert into the hyper response, committing as `end()` if never finalized
    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status.unwrap_or(StatusCode::OK);
        let body = match self.body {
            Some(bytes) => full(bytes),
            None => empty(),
        };
        let mut resp = Response::new(body);
        *resp.status_mut() = status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    fn writer() -> ResponseWriter {
        ResponseWriter::new(Arc::new(MimeTypes::new()))
    }

    async fn body_bytes(resp: Response<ResponseBody>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_send_text() {
        let mut res = writer();
        res.status(201).set("X-Trace", "abc");
        res.send("created").unwrap();
        assert!(res.headers_sent());

        let resp = res.into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(resp.headers()["x-trace"], "abc");
        assert_eq!(resp.headers()["content-length"], "7");
        assert_eq!(body_bytes(resp).await, "created");
    }

    #[tokio::test]
    async fn test_json_defaults_to_200() {
        let mut res = writer();
        res.json(&json!({"id": "42"})).unwrap();
        let resp = res.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(body_bytes(resp).await, r#"{"id":"42"}"#);
    }

    #[tokio::test]
    async fn test_send_object_is_json_and_scalar_is_text() {
        let mut res = writer();
        res.send(json!({"ok": true})).unwrap();
        assert_eq!(res.header("content-type"), Some("application/json"));

        let mut res = writer();
        res.send(json!(42)).unwrap();
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert_eq!(body_bytes(res.into_response()).await, "42");
    }

    #[test]
    fn test_send_binary_sniffs_magic_bytes() {
        let mut res = writer();
        res.send(b"%PDF-1.4\n...".as_slice()).unwrap();
        assert_eq!(res.header("content-type"), Some("application/pdf"));

        let mut res = writer();
        res.send(vec![0u8, 1, 2, 3]).unwrap();
        assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    }

    #[test]
    fn test_explicit_content_type_wins() {
        let mut res = writer();
        res.content_type("html");
        res.send("<h1>hi</h1>").unwrap();
        assert_eq!(res.header("content-type"), Some("text/html"));

        let mut res = writer();
        res.content_type("nope");
        assert_eq!(res.header("content-type"), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_mutations_after_send_are_ignored() {
        let mut res = writer();
        res.end().unwrap();
        res.status(500).set("X-Late", "1").content_type("json");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("x-late"), None);
        assert_eq!(res.header("content-type"), None);

        let resp = res.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_bytes(resp).await.is_empty());
    }

    #[test]
    fn test_status_after_json_is_ignored() {
        let mut res = writer();
        res.json(&json!([1, 2])).unwrap();
        res.status(404);
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_finalizer_fails_and_keeps_first_body() {
        let mut res = writer();
        res.send("first").unwrap();
        assert!(matches!(res.send("second"), Err(ResponseError::AlreadySent)));
        assert!(matches!(res.end(), Err(ResponseError::AlreadySent)));
        assert!(matches!(
            res.json(&json!({})),
            Err(ResponseError::AlreadySent)
        ));
        assert_eq!(body_bytes(res.into_response()).await, "first");
    }

    #[test]
    fn test_invalid_status_and_header_are_ignored() {
        let mut res = writer();
        res.status(1000).set("bad header", "x").set("X-Ok", "line\nbreak");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_set_all() {
        let mut res = writer();
        res.set_all([("Cache-Control", "no-store"), ("X-Frame-Options", "DENY")]);
        assert_eq!(res.header("cache-control"), Some("no-store"));
        assert_eq!(res.header("x-frame-options"), Some("DENY"));
    }

    #[test]
    fn test_seeded_headers_can_be_overridden() {
        let mut seed = HeaderMap::new();
        seed.insert("access-control-allow-origin", HeaderValue::from_static("*"));
        let mut res = writer();
        res.seed_headers(&seed);
        res.set("Access-Control-Allow-Origin", "https://example.com");
        assert_eq!(
            res.header("access-control-allow-origin"),
            Some("https://example.com")
        );
    }
}
