//! Configuration for the warren-dns proxy, organized by concern:
//! - `root`: top-level config, file loading and CLI overrides
//! - `server`: listen address and port
//! - `dns`: upstream resolution and cache/refresh tuning
//! - `logging`: log level and output format
//! - `errors`: configuration errors

pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
