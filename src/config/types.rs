// Configuration types module
// Defines all configuration-related data structures

use crate::logger::AccessLogFormat;
use crate::routing::CorsPolicy;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub static_files: StaticFilesConfig,
    /// Replaces the default open CORS policy when present
    #[serde(default)]
    pub cors: Option<CorsPolicy>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Serve HTTPS when set
    #[serde(default)]
    pub tls: Option<TlsFileConfig>,
}

/// PEM certificate chain and private key locations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TlsFileConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default)]
    pub access_log_format: AccessLogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: AccessLogFormat::default(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
    pub keep_alive: bool,
    /// Upper bound on a connection's lifetime, in seconds (0 disables)
    pub connection_timeout: u64,
}

/// Static file serving configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StaticFilesConfig {
    /// Root folder; static serving is enabled when set
    #[serde(default)]
    pub root: Option<String>,
}
