//! HTTP router with parameterized routes, CORS, static files and MIME detection
//!
//! ```no_run
//! use rust_router::{Request, ResponseWriter, Router};
//!
//! # async fn run() -> Result<(), rust_router::RouterError> {
//! let mut router = Router::new();
//! router.get("/hello/:name", |req: Request, mut res: ResponseWriter| async move {
//!     let name = req.param("name").unwrap_or("world").to_string();
//!     res.send(format!("Hello, {name}"))?;
//!     Ok(res)
//! })?;
//! router.serve_static_files("./public");
//! router.listen(8080, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod router;
pub mod routing;
pub mod server;

pub use error::{HandlerError, MimeError, ResponseError, RouterError};
pub use handler::{BoxedHandler, Dispatcher, Handler, HandlerResult};
pub use http::{MimeTypes, Params, Payload, Request, ResponseWriter};
pub use router::Router;
pub use routing::{CorsPolicy, CorsValue};
pub use server::{ServerHandle, ServerOptions, TlsOptions};
