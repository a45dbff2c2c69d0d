//! Client configuration.
//!
//! Settings can come from three places, applied in this order: built-in
//! defaults, a TOML file, and `NAKAMA_*` environment variables.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default server port for plain connections.
pub const DEFAULT_PORT: u16 = 7350;

fn default_server_key() -> String {
    "defaultkey".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_tick_interval() -> u64 {
    50 // 20 pumps per second
}

fn default_heartbeat_interval() -> u64 {
    3_000
}

/// Connection settings shared by the HTTP and realtime clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server key used for basic auth on the authenticate endpoints
    #[serde(default = "default_server_key")]
    pub server_key: String,
    /// Server host name or address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Use https and wss
    #[serde(default)]
    pub ssl: bool,
    /// Per-request timeout in milliseconds (0 waits forever)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Suggested interval between `tick()` calls in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Realtime ping interval in milliseconds (0 disables the heartbeat)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_key: default_server_key(),
            host: default_host(),
            port: default_port(),
            ssl: false,
            request_timeout_ms: default_request_timeout(),
            tick_interval_ms: default_tick_interval(),
            heartbeat_interval_ms: default_heartbeat_interval(),
        }
    }
}

impl ClientConfig {
    pub fn new(server_key: impl Into<String>, host: impl Into<String>, port: u16, ssl: bool) -> Self {
        Self {
            server_key: server_key.into(),
            host: host.into(),
            port,
            ssl,
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, writes the default configuration to `path`
    /// and returns it.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The loaded or default configuration, or an error if reading, parsing
    /// or writing the file failed.
    pub async fn load_from_file(path: &Path) -> Result<Self, ClientError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: ClientConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = ClientConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("📝 Created default client configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Overrides fields from `NAKAMA_SERVER_KEY`, `NAKAMA_HOST`,
    /// `NAKAMA_PORT` and `NAKAMA_SSL` when they are set.
    pub fn apply_env(mut self) -> Result<Self, ClientError> {
        if let Ok(key) = std::env::var("NAKAMA_SERVER_KEY") {
            self.server_key = key;
        }
        if let Ok(host) = std::env::var("NAKAMA_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("NAKAMA_PORT") {
            self.port = port
                .parse()
                .map_err(|_| ClientError::Config(format!("NAKAMA_PORT is not a port: {port}")))?;
        }
        if let Ok(ssl) = std::env::var("NAKAMA_SSL") {
            self.ssl = matches!(ssl.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(self)
    }

    /// Defaults overlaid with the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::default().apply_env()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.server_key.is_empty() {
            return Err("Server key cannot be empty".to_string());
        }
        if self.host.trim().is_empty() {
            return Err("Host cannot be empty".to_string());
        }
        if self.host.contains("://") {
            return Err(format!("Host must not include a scheme: {}", self.host));
        }
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.tick_interval_ms == 0 {
            return Err("Tick interval must be greater than 0".to_string());
        }
        Ok(())
    }

    /// `http(s)://host:port`
    pub fn http_base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.url_host(), self.port)
    }

    /// `ws(s)://host:port/ws`
    pub fn ws_base_url(&self) -> String {
        let scheme = if self.ssl { "wss" } else { "ws" };
        format!("{}://{}:{}/ws", scheme, self.url_host(), self.port)
    }

    /// The host as it appears in a URL; IPv6 literals get brackets.
    fn url_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }
}
