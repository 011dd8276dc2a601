//! Routing module
//!
//! Provides route pattern compilation, the per-method route table with
//! first-match-wins lookup, and the CORS policy applied to responses.

mod cors;
mod matcher;
mod pattern;

pub use cors::{CorsPolicy, CorsValue};
pub use matcher::{match_route, Route, RouteTable, ROUTED_METHODS};
pub use pattern::CompiledPattern;
