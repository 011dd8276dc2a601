//! CORS policy
//!
//! A header-name to value(s) map applied to every dispatched response and to
//! `OPTIONS` preflight responses.

use crate::logger;
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single header value or a list sent as repeated header lines
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsValue {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for CorsValue {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<String> for CorsValue {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<String>> for CorsValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl CorsValue {
    fn values(&self) -> &[String] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::List(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CorsPolicy {
    headers: BTreeMap<String, CorsValue>,
}

impl CorsPolicy {
    /// A policy with no headers at all
    pub const fn empty() -> Self {
        Self {
            headers: BTreeMap::new(),
        }
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CorsValue>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CorsValue> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CorsValue)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Render into a header map, skipping (and logging) invalid entries
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let Ok(header) = HeaderName::from_bytes(name.as_bytes()) else {
                logger::log_warning(&format!("Skipping invalid CORS header name '{name}'"));
                continue;
            };
            for v in value.values() {
                match HeaderValue::from_str(v) {
                    Ok(hv) => {
                        map.append(header.clone(), hv);
                    }
                    Err(_) => logger::log_warning(&format!(
                        "Skipping invalid CORS header value '{name}: {v}'"
                    )),
                }
            }
        }
        map
    }
}

impl Default for CorsPolicy {
    /// Open wildcard policy
    fn default() -> Self {
        Self::from_headers([
            ("Access-Control-Allow-Origin", "*"),
            (
                "Access-Control-Allow-Methods",
                "GET, POST, PUT, DELETE, PATCH, OPTIONS",
            ),
            ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
        ])
    }
}
