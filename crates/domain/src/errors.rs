use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    #[error("Malformed DNS message: {0}")]
    WireFormat(String),

    #[error("Upstream query timed out after {0}ms")]
    UpstreamTimeout(u64),

    #[error("No upstream nameserver reachable")]
    UpstreamUnreachable,

    #[error("I/O error: {0}")]
    Io(String),
}
