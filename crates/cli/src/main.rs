//! # Warren DNS
//!
//! Embedded caching DNS-forwarding proxy for sandboxed workloads.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use warren_dns_domain::CliOverrides;

mod bootstrap;
mod server;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "warren-dns")]
#[command(version)]
#[command(about = "Embedded caching DNS-forwarding proxy")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// DNS listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Upstream nameservers as a comma-separated ip:port list
    #[arg(short, long, value_delimiter = ',')]
    upstream: Option<Vec<String>>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        bind_address: cli.bind,
        port: cli.port,
        upstream_servers: cli.upstream,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    server::run(config, shutdown).await
}
