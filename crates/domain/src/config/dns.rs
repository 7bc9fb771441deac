use serde::{Deserialize, Serialize};

/// DNS resolution and cache/refresh configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_upstream_servers")]
    pub upstream_servers: Vec<String>,

    /// Per-query upstream timeout in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Ceiling applied to every record TTL at insert time, in seconds.
    /// Absent means the authoritative TTL is cached as-is.
    #[serde(default)]
    pub max_cache_ttl: Option<u32>,

    /// Seconds-to-live at which a hot entry becomes eligible for
    /// refresh-ahead.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold: u32,

    /// An entry is only refreshed if it was read within this many seconds.
    #[serde(default = "default_refresh_max_age")]
    pub refresh_max_age: u64,

    #[serde(default = "default_refresh_workers")]
    pub refresh_workers: usize,

    #[serde(default = "default_refresh_queue_size")]
    pub refresh_queue_size: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: default_upstream_servers(),
            query_timeout: default_query_timeout(),
            cache_enabled: true,
            max_cache_ttl: None,
            refresh_threshold: default_refresh_threshold(),
            refresh_max_age: default_refresh_max_age(),
            refresh_workers: default_refresh_workers(),
            refresh_queue_size: default_refresh_queue_size(),
        }
    }
}

fn default_upstream_servers() -> Vec<String> {
    vec!["8.8.8.8:53".to_string(), "1.1.1.1:53".to_string()]
}

fn default_query_timeout() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_refresh_threshold() -> u32 {
    5
}

fn default_refresh_max_age() -> u64 {
    180
}

fn default_refresh_workers() -> usize {
    5
}

fn default_refresh_queue_size() -> usize {
    100
}
