use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};
use warren_dns_application::UpstreamResolver;
use warren_dns_domain::DnsError;

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP to a configured list of nameservers, tried in order.
/// Each query uses an ephemeral socket; the per-query timeout bounds both
/// the send and the receive.
pub struct UdpUpstream {
    servers: Vec<SocketAddr>,
}

impl UdpUpstream {
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self { servers }
    }

    pub fn from_servers(servers: &[String]) -> Result<Self, DnsError> {
        let servers = servers
            .iter()
            .map(|s| {
                s.parse::<SocketAddr>()
                    .map_err(|e| DnsError::InvalidName(format!("upstream '{}': {}", s, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(servers))
    }

    async fn query_server(
        &self,
        server: SocketAddr,
        request: &[u8],
        timeout: Duration,
    ) -> Result<Bytes, DnsError> {
        let bind_addr: SocketAddr = if server.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DnsError::Io(format!("Failed to bind UDP socket: {}", e)))?;

        let bytes_sent = tokio::time::timeout(timeout, socket.send_to(request, server))
            .await
            .map_err(|_| DnsError::UpstreamTimeout(timeout.as_millis() as u64))?
            .map_err(|e| DnsError::Io(format!("Failed to send query to {}: {}", server, e)))?;

        debug!(server = %server, bytes_sent = bytes_sent, "Upstream query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];

        let (bytes_received, from_addr) =
            tokio::time::timeout(timeout, socket.recv_from(&mut recv_buf))
                .await
                .map_err(|_| DnsError::UpstreamTimeout(timeout.as_millis() as u64))?
                .map_err(|e| {
                    DnsError::Io(format!("Failed to receive reply from {}: {}", server, e))
                })?;

        if from_addr.ip() != server.ip() {
            warn!(
                expected = %server,
                received_from = %from_addr,
                "UDP reply from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(server = %server, bytes_received = bytes_received, "Upstream reply received");

        Ok(Bytes::from(recv_buf))
    }
}

#[async_trait]
impl UpstreamResolver for UdpUpstream {
    async fn query(&self, request: &[u8], timeout: Duration) -> Result<Bytes, DnsError> {
        for &server in &self.servers {
            match self.query_server(server, request, timeout).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!(server = %server, error = %e, "Upstream query failed, trying next server");
                }
            }
        }

        Err(DnsError::UpstreamUnreachable)
    }
}
