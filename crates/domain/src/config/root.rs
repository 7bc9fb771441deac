use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Top-level proxy configuration, loaded from a TOML file with CLI
/// overrides applied on top.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Command-line overrides. `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub upstream_servers: Option<Vec<String>>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration. A missing path (or a path that does not exist)
    /// yields the built-in defaults; a present but unreadable or invalid
    /// file is an error.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if Path::new(p).exists() => {
                let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_string(),
                    source,
                })?;
                toml::from_str(&raw)?
            }
            _ => Config::default(),
        };

        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(servers) = overrides.upstream_servers {
            self.dns.upstream_servers = servers;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dns.upstream_servers.is_empty() {
            return Err(ConfigError::Validation(
                "at least one upstream nameserver is required".to_string(),
            ));
        }

        for server in &self.dns.upstream_servers {
            if server.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "upstream server '{}' is not a valid ip:port address",
                    server
                )));
            }
        }

        if self.dns.query_timeout == 0 {
            return Err(ConfigError::Validation(
                "query_timeout must be greater than zero".to_string(),
            ));
        }

        if self.dns.refresh_threshold == 0 {
            return Err(ConfigError::Validation(
                "refresh_threshold must be greater than zero".to_string(),
            ));
        }

        if self.dns.refresh_workers == 0 {
            return Err(ConfigError::Validation(
                "refresh_workers must be greater than zero".to_string(),
            ));
        }

        if self.dns.refresh_queue_size == 0 {
            return Err(ConfigError::Validation(
                "refresh_queue_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
