//! Router facade
//!
//! Collects routes, CORS policy, static settings and MIME overrides, then
//! binds a listener with [`Router::listen`] and stops it with [`Router::close`].

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::Method;

use crate::error::{MimeError, RouterError};
use crate::handler::{self, BoxedHandler, Dispatcher, HandlerResult};
use crate::http::{Request, ResponseWriter};
use crate::logger;
use crate::routing::CorsPolicy;
use crate::server::{self, ServerHandle, ServerOptions, TlsOptions};

/// An HTTP router and its (optional) running listener
#[derive(Debug, Default)]
pub struct Router {
    dispatcher: Dispatcher,
    options: ServerOptions,
    server: Option<ServerHandle>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with explicit transport settings
    pub fn with_options(options: ServerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Transport settings used by the next `listen`
    pub fn set_options(&mut self, options: ServerOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub fn get<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(&Method::GET, pattern, handler::boxed(handler))
    }

    pub fn put<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(&Method::PUT, pattern, handler::boxed(handler))
    }

    pub fn post<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(&Method::POST, pattern, handler::boxed(handler))
    }

    pub fn delete<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(&Method::DELETE, pattern, handler::boxed(handler))
    }

    pub fn patch<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(&Method::PATCH, pattern, handler::boxed(handler))
    }

    /// Register the same handler for GET, PUT, POST, DELETE and PATCH.
    ///
    /// Each method gets its own route entry with its own compiled matcher.
    pub fn all<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouterError>
    where
        F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.dispatcher
            .add_route_all(pattern, &handler::boxed(handler))?;
        Ok(self)
    }

    /// Register an already boxed handler
    pub fn route(
        &mut self,
        method: &Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<&mut Self, RouterError> {
        self.dispatcher.add_route(method, pattern, handler)?;
        Ok(self)
    }

    /// Serve files below `folder` for requests no route matches
    pub fn serve_static_files(&mut self, folder: impl Into<PathBuf>) -> &mut Self {
        self.dispatcher.serve_static_files(folder);
        self
    }

    pub const fn cors(&self) -> &CorsPolicy {
        self.dispatcher.cors()
    }

    /// Replace the whole CORS header set
    pub fn set_cors(&mut self, policy: CorsPolicy) -> &mut Self {
        self.dispatcher.set_cors(policy);
        self
    }

    /// Override a MIME type for this router (static files and `content_type`)
    pub fn add_mime_type(&mut self, extension: &str, mime_type: &str) -> Result<&mut Self, MimeError> {
        self.dispatcher.add_mime_type(extension, mime_type)?;
        Ok(self)
    }

    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Listen on `0.0.0.0:port`, serving HTTPS when `tls` is given
    pub async fn listen(
        &mut self,
        port: u16,
        tls: Option<TlsOptions>,
    ) -> Result<SocketAddr, RouterError> {
        self.listen_on(SocketAddr::from(([0, 0, 0, 0], port)), tls)
            .await
    }

    /// Listen on an explicit address.
    ///
    /// The current routes, CORS policy, static settings and MIME table are
    /// frozen for this listener; later registrations apply to the next one.
    pub async fn listen_on(
        &mut self,
        addr: SocketAddr,
        tls: Option<TlsOptions>,
    ) -> Result<SocketAddr, RouterError> {
        if let Some(server) = &self.server {
            return Err(RouterError::AlreadyListening(server.local_addr()));
        }

        let acceptor = match tls.as_ref().map(TlsOptions::build_acceptor).transpose() {
            Ok(acceptor) => acceptor,
            Err(e) => {
                logger::log_error(&format!("Failed to start server on {addr}: {e}"));
                return Err(e);
            }
        };

        let listener = server::create_reusable_listener(addr).map_err(|source| {
            logger::log_bind_failed(&addr, &source);
            RouterError::Bind { addr, source }
        })?;

        let handle = server::start(
            listener,
            Arc::new(self.dispatcher.clone()),
            self.options.clone(),
            acceptor,
        )
        .map_err(|source| {
            logger::log_bind_failed(&addr, &source);
            RouterError::Bind { addr, source }
        })?;

        let local_addr = handle.local_addr();
        logger::log_server_start(&local_addr, handle.is_tls());
        self.server = Some(handle);
        Ok(local_addr)
    }

    /// Stop accepting connections; open connections finish on their own
    pub async fn close(&mut self) -> Result<(), RouterError> {
        let server = self.server.take().ok_or(RouterError::NotListening)?;
        server.shutdown().await;
        Ok(())
    }

    /// The running listener, if any
    pub const fn server_instance(&self) -> Option<&ServerHandle> {
        self.server.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResponseError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn http_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_registration_chains() {
        let mut router = Router::new();
        router
            .get("/a", |_req, mut res: ResponseWriter| async move {
                res.end()?;
                Ok(res)
            })
            .unwrap()
            .post("/a", |_req, mut res: ResponseWriter| async move {
                res.end()?;
                Ok(res)
            })
            .unwrap()
            .all("/b", |_req, mut res: ResponseWriter| async move {
                res.end()?;
                Ok(res)
            })
            .unwrap();
        assert_eq!(router.dispatcher().routes().len(), 7);
        assert!(router.server_instance().is_none());
    }

    #[test]
    fn test_add_mime_type_rejects_empty() {
        let mut router = Router::new();
        assert!(router.add_mime_type("", "text/x").is_err());
        router.add_mime_type("mjs", "text/javascript").unwrap();
        assert_eq!(
            router.dispatcher().mime_types().type_for_extension("mjs"),
            Some("text/javascript")
        );
    }

    #[tokio::test]
    async fn test_close_without_listen() {
        let mut router = Router::new();
        assert!(matches!(
            router.close().await,
            Err(RouterError::NotListening)
        ));
    }

    #[tokio::test]
    async fn test_listen_serves_and_closes() {
        let mut router = Router::with_options(ServerOptions {
            access_log: None,
            ..ServerOptions::default()
        });
        router
            .get("/hello/:name", |req: Request, mut res: ResponseWriter| async move {
                let name = req.param("name").unwrap_or("nobody").to_string();
                res.status(201).send(format!("Hello, {name}"))?;
                Ok::<_, crate::error::HandlerError>(res)
            })
            .unwrap();

        let addr = router
            .listen_on("127.0.0.1:0".parse().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(router.server_instance().unwrap().local_addr(), addr);
        assert!(!router.server_instance().unwrap().is_tls());

        // a second listen on the same router is refused
        assert!(matches!(
            router.listen_on("127.0.0.1:0".parse().unwrap(), None).await,
            Err(RouterError::AlreadyListening(a)) if a == addr
        ));

        let response = http_get(addr, "/hello/ferris").await;
        assert!(response.starts_with("HTTP/1.1 201"), "{response}");
        assert!(response.contains("access-control-allow-origin: *"));
        assert!(response.ends_with("Hello, ferris"));

        let response = http_get(addr, "/nothing").await;
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");
        assert!(response.ends_with("Route Not Found"));

        router.close().await.unwrap();
        assert!(router.server_instance().is_none());
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut router = Router::new();
        router.set_options(ServerOptions {
            max_body_size: 4,
            access_log: None,
            ..ServerOptions::default()
        });
        assert_eq!(router.options().max_body_size, 4);
        router
            .post("/upload", |req: Request, mut res: ResponseWriter| async move {
                res.send(req.body().clone())?;
                Ok::<_, crate::error::HandlerError>(res)
            })
            .unwrap();
        let addr = router
            .listen_on("127.0.0.1:0".parse().unwrap(), None)
            .await
            .unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                b"POST /upload HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 10\r\n\r\n0123456789",
            )
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 413"), "{response}");
        assert!(response.contains("access-control-allow-origin: *"), "{response}");

        router.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_https_round_trip() {
        use tokio_rustls::rustls::pki_types::ServerName;
        use tokio_rustls::rustls::{self, RootCertStore};
        use tokio_rustls::TlsConnector;

        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let tls = TlsOptions::from_pem(certified.cert.pem(), certified.key_pair.serialize_pem());

        let mut router = Router::with_options(ServerOptions {
            access_log: None,
            ..ServerOptions::default()
        });
        router
            .get("/x/:id", |req: Request, mut res: ResponseWriter| async move {
                let id = req.param("id").unwrap_or_default().to_string();
                res.send(id)?;
                Ok::<_, crate::error::HandlerError>(res)
            })
            .unwrap();
        let addr = router
            .listen_on("127.0.0.1:0".parse().unwrap(), Some(tls))
            .await
            .unwrap();
        assert!(router.server_instance().unwrap().is_tls());

        let mut roots = RootCertStore::empty();
        roots.add(certified.cert.der().clone()).unwrap();
        let client_config =
            rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_safe_default_protocol_versions()
                .unwrap()
                .with_root_certificates(roots)
                .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(client_config));

        let tcp = TcpStream::connect(addr).await.unwrap();
        let mut stream = connector
            .connect(ServerName::try_from("localhost").unwrap(), tcp)
            .await
            .unwrap();
        stream
            .write_all(b"GET /x/abc HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = Vec::new();
        // the peer may close without close_notify; keep whatever arrived
        let _ = stream.read_to_end(&mut raw).await;
        let response = String::from_utf8_lossy(&raw);

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("access-control-allow-origin: *"), "{response}");
        assert!(response.ends_with("abc"), "{response}");

        router.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = blocker.local_addr().unwrap();

        let mut router = Router::new();
        let result = router.listen_on(addr, None).await;
        assert!(matches!(result, Err(RouterError::Bind { .. })));
        assert!(router.server_instance().is_none());
    }

    #[tokio::test]
    async fn test_invalid_tls_is_reported() {
        let mut router = Router::new();
        let result = router
            .listen_on(
                "127.0.0.1:0".parse().unwrap(),
                Some(TlsOptions::from_pem(Vec::new(), Vec::new())),
            )
            .await;
        assert!(matches!(result, Err(RouterError::Tls(_))));
        assert!(router.server_instance().is_none());
    }

    #[test]
    fn test_double_send_is_reported() {
        let mut res = ResponseWriter::new(Arc::new(crate::http::MimeTypes::new()));
        res.send("one").unwrap();
        assert!(matches!(res.send("two"), Err(ResponseError::AlreadySent)));
    }
}
