//! Route table and matching
//!
//! Each method owns an append-only list of routes, scanned in registration
//! order. The first structural match wins, so a more specific pattern has to
//! be registered before an overlapping general one.

use crate::error::RouterError;
use crate::handler::BoxedHandler;
use crate::http::request::Params;
use crate::routing::pattern::CompiledPattern;
use hyper::Method;

/// A registered route
#[derive(Clone)]
pub struct Route {
    pub pattern: String,
    pub matcher: CompiledPattern,
    pub handler: BoxedHandler,
}

impl Route {
    pub fn new(pattern: &str, handler: BoxedHandler) -> Result<Self, RouterError> {
        Ok(Self {
            pattern: pattern.to_string(),
            matcher: CompiledPattern::compile(pattern)?,
            handler,
        })
    }

    pub fn param_names(&self) -> &[String] {
        self.matcher.param_names()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("matcher", &self.matcher.as_str())
            .finish_non_exhaustive()
    }
}

/// Methods that own a route list
pub const ROUTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::PATCH,
];

/// Per-method ordered route lists
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    get: Vec<Route>,
    put: Vec<Route>,
    post: Vec<Route>,
    delete: Vec<Route>,
    patch: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route list for a method, `None` for methods without one
    pub fn routes(&self, method: &Method) -> Option<&[Route]> {
        match *method {
            Method::GET => Some(&self.get),
            Method::PUT => Some(&self.put),
            Method::POST => Some(&self.post),
            Method::DELETE => Some(&self.delete),
            Method::PATCH => Some(&self.patch),
            _ => None,
        }
    }

    fn routes_mut(&mut self, method: &Method) -> Option<&mut Vec<Route>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::PUT => Some(&mut self.put),
            Method::POST => Some(&mut self.post),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            _ => None,
        }
    }

    /// Compile `pattern` and append it to the list for `method`.
    ///
    /// Returns `false` when the method has no route list.
    pub fn insert(
        &mut self,
        method: &Method,
        pattern: &str,
        handler: BoxedHandler,
    ) -> Result<bool, RouterError> {
        let Some(list) = self.routes_mut(method) else {
            return Ok(false);
        };
        list.push(Route::new(pattern, handler)?);
        Ok(true)
    }

    /// Number of routes registered across all methods
    pub fn len(&self) -> usize {
        self.get.len() + self.put.len() + self.post.len() + self.delete.len() + self.patch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first route for `method` whose pattern matches `path`
    pub fn match_route<'a>(&'a self, method: &Method, path: &str) -> Option<(&'a Route, Params)> {
        match_route(path, self.routes(method)?)
    }
}

/// Find the first matching route in registration order
pub fn match_route<'a>(path: &str, routes: &'a [Route]) -> Option<(&'a Route, Params)> {
    routes
        .iter()
        .find_map(|route| route.matcher.captures(path).map(|params| (route, params)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::boxed;
    use crate::http::request::Request;
    use crate::http::writer::ResponseWriter;

    fn noop() -> BoxedHandler {
        boxed(|_req: Request, res: ResponseWriter| async move { Ok(res) })
    }

    fn table_with(method: &Method, patterns: &[&str]) -> RouteTable {
        let mut table = RouteTable::new();
        for p in patterns {
            assert!(table.insert(method, p, noop()).unwrap());
        }
        table
    }

    #[test]
    fn test_match_route_order() {
        let table = table_with(&Method::GET, &["/user/:id", "/user/admin"]);

        let (route, params) = table.match_route(&Method::GET, "/user/admin").unwrap();
        assert_eq!(route.pattern, "/user/:id");
        assert_eq!(params["id"], "admin");
    }

    #[test]
    fn test_specific_first_wins_when_registered_first() {
        let table = table_with(&Method::GET, &["/user/admin", "/user/:id"]);

        let (route, params) = table.match_route(&Method::GET, "/user/admin").unwrap();
        assert_eq!(route.pattern, "/user/admin");
        assert!(params.is_empty());

        let (route, _) = table.match_route(&Method::GET, "/user/7").unwrap();
        assert_eq!(route.pattern, "/user/:id");
    }

    #[test]
    fn test_method_isolation() {
        let table = table_with(&Method::POST, &["/items"]);
        assert!(table.match_route(&Method::GET, "/items").is_none());
        assert!(table.match_route(&Method::POST, "/items").is_some());
    }

    #[test]
    fn test_unrouted_methods() {
        let mut table = RouteTable::new();
        assert!(!table.insert(&Method::HEAD, "/x", noop()).unwrap());
        assert!(table.routes(&Method::OPTIONS).is_none());
        assert!(table.match_route(&Method::HEAD, "/x").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_len_counts_every_list() {
        let mut table = RouteTable::new();
        for method in &ROUTED_METHODS {
            table.insert(method, "/ping", noop()).unwrap();
        }
        assert_eq!(table.len(), 5);
        for method in &ROUTED_METHODS {
            assert_eq!(table.routes(method).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_param_names_follow_pattern() {
        let route = Route::new("/a/:x/b/:y", noop()).unwrap();
        assert_eq!(route.param_names(), ["x", "y"]);
    }
}
