//! HTTP protocol layer module
//!
//! Request and response types shared by handlers, the dispatcher and the
//! static file server, plus MIME detection.

pub mod mime;
pub mod request;
pub mod response;
pub mod writer;

// Re-export commonly used types
pub use mime::MimeTypes;
pub use request::{Params, Request};
pub use response::ResponseBody;
pub use writer::{Payload, ResponseWriter};
