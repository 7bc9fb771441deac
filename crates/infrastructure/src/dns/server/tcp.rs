use super::handler::QueryHandler;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Connections with no complete query within this window are closed.
const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept loop with one task per connection. DNS over TCP frames every
/// message with a two-byte length prefix.
pub async fn serve_tcp(
    listener: TcpListener,
    handler: Arc<QueryHandler>,
    shutdown: CancellationToken,
) {
    info!(protocol = "TCP", "DNS listener started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("TCP listener: shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "TCP accept failed");
                        continue;
                    }
                };

                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    handle_connection(stream, peer, handler).await;
                });
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, handler: Arc<QueryHandler>) {
    debug!(peer = %peer, "TCP connection opened");

    loop {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            // Idle timeout or client hangup both end the connection.
            _ => break,
        }

        let len = u16::from_be_bytes(len_buf) as usize;
        if len == 0 {
            break;
        }

        let mut packet = vec![0u8; len];
        match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut packet)).await {
            Ok(Ok(_)) => {}
            _ => break,
        }

        let reply = match handler.handle(&packet).await {
            Some(reply) if reply.len() <= u16::MAX as usize => reply,
            _ => break,
        };

        let mut framed = Vec::with_capacity(reply.len() + 2);
        framed.extend_from_slice(&(reply.len() as u16).to_be_bytes());
        framed.extend_from_slice(&reply);

        if let Err(e) = stream.write_all(&framed).await {
            debug!(peer = %peer, error = %e, "Failed to write TCP reply");
            break;
        }
    }

    debug!(peer = %peer, "TCP connection closed");
}
