use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use warren_dns_domain::DnsError;

/// Executes one DNS query against the configured upstream nameservers.
///
/// The request and reply are wire-format DNS messages, opaque to this layer.
/// Consumed by the request handler's miss path and by the refresh worker
/// pool; both treat any `Err` as "no fresh answer".
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    async fn query(&self, request: &[u8], timeout: Duration) -> Result<Bytes, DnsError>;
}
