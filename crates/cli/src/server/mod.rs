use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warren_dns_application::UpstreamResolver;
use warren_dns_domain::Config;
use warren_dns_infrastructure::dns::cache::{CacheStore, RefreshPolicy, RefreshPool, TtlSweeper};
use warren_dns_infrastructure::dns::server::{serve_tcp, serve_udp, QueryHandler};
use warren_dns_infrastructure::dns::UdpUpstream;

/// Wire everything up and serve until the shutdown token fires. Every
/// spawned task honors the token, so cancellation drains the whole proxy.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    info!(
        listen = %config.server.listen_addr(),
        upstreams = ?config.dns.upstream_servers,
        cache_enabled = config.dns.cache_enabled,
        "Configuration loaded"
    );

    let query_timeout = Duration::from_millis(config.dns.query_timeout);
    let upstream: Arc<dyn UpstreamResolver> =
        Arc::new(UdpUpstream::from_servers(&config.dns.upstream_servers)?);

    let store = Arc::new(CacheStore::new(config.dns.max_cache_ttl));

    let mut tasks = Vec::new();

    if config.dns.cache_enabled {
        let (refresh_tx, refresh_rx) = mpsc::channel(config.dns.refresh_queue_size);

        let policy = RefreshPolicy {
            threshold: config.dns.refresh_threshold,
            max_age: Duration::from_secs(config.dns.refresh_max_age),
        };

        let sweeper = TtlSweeper::new(Arc::clone(&store), refresh_tx, policy)
            .with_cancellation(shutdown.clone());
        tasks.push(sweeper.spawn());

        let pool = RefreshPool::new(
            Arc::clone(&store),
            Arc::clone(&upstream),
            config.dns.refresh_workers,
            query_timeout,
        )
        .with_cancellation(shutdown.clone());
        tasks.extend(pool.spawn(refresh_rx));
    }

    let handler = Arc::new(QueryHandler::new(
        Arc::clone(&store),
        upstream,
        query_timeout,
        config.dns.cache_enabled,
    ));

    let listen_addr = config.server.listen_addr();
    let udp_socket = Arc::new(UdpSocket::bind(&listen_addr).await?);
    let tcp_listener = TcpListener::bind(&listen_addr).await?;

    info!(listen = %listen_addr, "DNS proxy ready");

    tasks.push(tokio::spawn(serve_udp(
        udp_socket,
        Arc::clone(&handler),
        shutdown.clone(),
    )));
    tasks.push(tokio::spawn(serve_tcp(tcp_listener, handler, shutdown)));

    futures::future::join_all(tasks).await;
    info!("DNS proxy stopped");

    Ok(())
}
