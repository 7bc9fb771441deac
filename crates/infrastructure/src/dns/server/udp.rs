use super::handler::QueryHandler;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Maximum inbound UDP DNS packet size with EDNS(0)
const MAX_UDP_PACKET_SIZE: usize = 4096;

/// Datagram loop: one spawned task per query so a slow upstream never
/// blocks the socket.
pub async fn serve_udp(
    socket: Arc<UdpSocket>,
    handler: Arc<QueryHandler>,
    shutdown: CancellationToken,
) {
    info!(protocol = "UDP", "DNS listener started");

    let mut buf = vec![0u8; MAX_UDP_PACKET_SIZE];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("UDP listener: shutting down");
                break;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!(error = %e, "UDP receive failed");
                        continue;
                    }
                };

                let packet = buf[..len].to_vec();
                let handler = Arc::clone(&handler);
                let socket = Arc::clone(&socket);

                tokio::spawn(async move {
                    if let Some(reply) = handler.handle(&packet).await {
                        if let Err(e) = socket.send_to(&reply, peer).await {
                            warn!(peer = %peer, error = %e, "Failed to send UDP reply");
                        }
                    }
                });
            }
        }
    }
}
