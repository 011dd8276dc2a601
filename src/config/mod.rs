// Configuration module entry point
// Loads settings from an optional TOML file, environment overrides and defaults

mod types;

use crate::server::{ServerOptions, TlsOptions};
use std::net::SocketAddr;
use std::time::Duration;

// Re-export public types
pub use types::{Config, HttpConfig, LoggingConfig, ServerConfig, StaticFilesConfig, TlsFileConfig};

/// Default config file (extension is resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ROUTER";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error; defaults and `ROUTER_*` environment
    /// variables fill in the rest. Variables name the full key path with `__`
    /// between section and field, e.g. `ROUTER_SERVER__PORT=9090` or
    /// `ROUTER_HTTP__MAX_BODY_SIZE=1048576`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::build(
            config::File::with_name(config_path).required(false),
            Some(environment()),
        )
    }

    /// Load from an in-memory TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        Self::build(
            config::File::from_str(toml, config::FileFormat::Toml),
            None,
        )
    }

    fn build<S>(source: S, env: Option<config::Environment>) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let mut builder = config::Config::builder().add_source(source);
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let settings = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("http.keep_alive", true)?
            .set_default("http.connection_timeout", 60)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Transport settings for the listener
    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            max_body_size: usize::try_from(self.http.max_body_size).unwrap_or(usize::MAX),
            keep_alive: self.http.keep_alive,
            connection_timeout: (self.http.connection_timeout > 0)
                .then(|| Duration::from_secs(self.http.connection_timeout)),
            access_log: self
                .logging
                .access_log
                .then_some(self.logging.access_log_format),
        }
    }

    /// TLS files to load, when HTTPS is configured
    pub fn tls_options(&self) -> Option<TlsOptions> {
        self.server
            .tls
            .as_ref()
            .map(|tls| TlsOptions::from_files(&tls.cert_path, &tls.key_path))
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
