//! Warren DNS domain layer: configuration and the error taxonomy.

pub mod config;
pub mod errors;

pub use config::{CliOverrides, Config, ConfigError, DnsConfig, LoggingConfig, ServerConfig};
pub use errors::DnsError;
