//! Route pattern compilation
//!
//! Turns `/user/:id` into the anchored regex `^/user/([^/]+)$` plus the
//! ordered parameter list `["id"]`.

use crate::error::RouterError;
use crate::http::request::Params;
use regex::Regex;

/// Anchored whole-path matcher compiled from a route pattern
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    param_names: Vec<String>,
}

impl CompiledPattern {
    /// Compile a route pattern.
    ///
    /// Empty segments are dropped, `:name` segments capture one or more
    /// non-`/` characters and every other segment is matched literally.
    /// Duplicate parameter names are accepted; the rightmost capture wins
    /// on extraction.
    pub fn compile(pattern: &str) -> Result<Self, RouterError> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        let mut param_names = Vec::new();

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            source.push('/');
            if let Some(name) = segment.strip_prefix(':') {
                source.push_str("([^/]+)");
                param_names.push(name.to_string());
            } else {
                source.push_str(&regex::escape(segment));
            }
        }

        if source.len() == 1 {
            source.push('/');
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self { regex, param_names })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and collect non-empty captures under their names
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let mut params = Params::with_capacity(self.param_names.len());
        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.get(i + 1).map(|m| m.as_str()) {
                if !value.is_empty() {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }
        Some(params)
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// The regex source this pattern compiled to
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
