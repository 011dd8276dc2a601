//! Request dispatch
//!
//! `OPTIONS` short-circuits with the CORS policy. Every other method is looked
//! up in its route list; the first matching route runs its handler. Requests
//! that match nothing fall back to static files or a 404.

use crate::error::{HandlerError, MimeError, RouterError};
use crate::handler::{static_files, BoxedHandler, HandlerResult, StaticConfig};
use crate::http::mime::MimeTypes;
use crate::http::request::Request;
use crate::http::response::{
    build_204_response, build_500_response, build_route_not_found, ResponseBody,
};
use crate::http::writer::ResponseWriter;
use crate::logger;
use crate::routing::{CorsPolicy, RouteTable, ROUTED_METHODS};
use hyper::{HeaderMap, Method, Response};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinError;

/// Routes, CORS policy, static settings and MIME table of one router
#[derive(Clone)]
pub struct Dispatcher {
    routes: RouteTable,
    cors: CorsPolicy,
    cors_headers: HeaderMap,
    static_config: StaticConfig,
    mime: Arc<MimeTypes>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let cors = CorsPolicy::default();
        Self {
            routes: RouteTable::new(),
            cors_headers: cors.to_header_map(),
            cors,
            static_config: StaticConfig::default(),
            mime: Arc::new(MimeTypes::new()),
        }
    }

    /// Append a route for `method`. Methods without a route list are
    /// rejected with a warning and leave the table untouched.
    pub fn add_route(
        &mut self,
        method: &Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<(), RouterError> {
        if self.routes.insert(method, pattern, handler)? {
            logger::log_route_registered(method, pattern);
        } else {
            logger::log_warning(&format!(
                "No route list for method {method}, ignoring '{pattern}'"
            ));
        }
        Ok(())
    }

    /// Register `handler` under every routed method, one route per method
    pub fn add_route_all(&mut self, pattern: &str, handler: &BoxedHandler) -> Result<(), RouterError> {
        for method in &ROUTED_METHODS {
            self.add_route(method, pattern, Arc::clone(handler))?;
        }
        Ok(())
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub const fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    pub fn set_cors(&mut self, policy: CorsPolicy) {
        self.cors_headers = policy.to_header_map();
        self.cors = policy;
    }

    pub fn serve_static_files(&mut self, folder: impl Into<PathBuf>) {
        self.static_config = StaticConfig::new(folder);
        logger::log_static_root(&self.static_config.root_folder);
    }

    pub const fn static_config(&self) -> &StaticConfig {
        &self.static_config
    }

    pub fn mime_types(&self) -> &MimeTypes {
        &self.mime
    }

    /// Override a MIME type for this router only
    pub fn add_mime_type(&mut self, extension: &str, mime_type: &str) -> Result<(), MimeError> {
        Arc::make_mut(&mut self.mime).add_type(extension, mime_type)
    }

    /// Dispatch one request to completion
    pub async fn dispatch(&self, mut req: Request) -> Response<ResponseBody> {
        if *req.method() == Method::OPTIONS {
            let mut resp = build_204_response();
            self.apply_cors(resp.headers_mut());
            return resp;
        }

        if let Some((route, params)) = self.routes.match_route(req.method(), req.path()) {
            let handler = Arc::clone(&route.handler);
            let pattern = route.pattern.clone();
            req.params = params;

            let mut res = ResponseWriter::new(Arc::clone(&self.mime));
            res.seed_headers(&self.cors_headers);
            return self.invoke(&handler, req, res, &pattern).await;
        }

        let mut resp = if self.static_config.enabled {
            static_files::serve(req.path(), &self.static_config.root_folder, &self.mime).await
        } else {
            build_route_not_found()
        };
        self.apply_cors(resp.headers_mut());
        resp
    }

    /// Run the handler in its own task so a panic only fails this request
    async fn invoke(
        &self,
        handler: &BoxedHandler,
        req: Request,
        res: ResponseWriter,
        pattern: &str,
    ) -> Response<ResponseBody> {
        let outcome: HandlerResult = match tokio::spawn(handler.call(req, res)).await {
            Ok(result) => result,
            Err(join_err) => Err(join_error_to_handler_error(join_err)),
        };

        match outcome {
            Ok(res) => {
                if !res.headers_sent() {
                    logger::log_warning(&format!(
                        "Handler for '{pattern}' returned without sending a response"
                    ));
                }
                res.into_response()
            }
            Err(err) => {
                logger::log_handler_failure(pattern, &err);
                let mut resp = build_500_response(&err.to_string());
                self.apply_cors(resp.headers_mut());
                resp
            }
        }
    }

    /// Replace any CORS headers in `headers` with this router's policy
    pub(crate) fn apply_cors(&self, headers: &mut HeaderMap) {
        for name in self.cors_headers.keys() {
            headers.remove(name);
            for value in self.cors_headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .field("cors", &self.cors)
            .field("static_config", &self.static_config)
            .finish_non_exhaustive()
    }
}

fn join_error_to_handler_error(err: JoinError) -> HandlerError {
    if err.is_panic() {
        HandlerError::panicked(&panic_message(err.into_panic().as_ref()))
    } else {
        HandlerError::new("handler task was cancelled")
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
