//! Request handler module
//!
//! Defines the handler contract, the dispatcher that picks a handler for each
//! request, and the static file fallback.

pub mod dispatcher;
pub mod static_files;

use crate::error::HandlerError;
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use dispatcher::Dispatcher;
pub use static_files::StaticConfig;

/// Future returned by a handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// A handler hands the writer back on success
pub type HandlerResult = Result<ResponseWriter, HandlerError>;

/// Shared, type-erased handler stored in route tables
pub type BoxedHandler = Arc<dyn Handler>;

/// A route handler.
///
/// Implemented for every `Fn(Request, ResponseWriter) -> impl Future<Output = HandlerResult>`,
/// so closures such as
/// `|req: Request, mut res: ResponseWriter| async move { res.send("hi")?; Ok(res) }`
/// can be registered directly.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request, res: ResponseWriter) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request, res: ResponseWriter) -> HandlerFuture {
        Box::pin(self(req, res))
    }
}

/// Erase a closure handler into the shared form
pub fn boxed<F, Fut>(handler: F) -> BoxedHandler
where
    F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(handler)
}
