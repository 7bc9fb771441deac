use super::store::{CacheStore, RefreshPolicy, RefreshTask};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Ticks between cache stats log lines.
const STATS_EVERY_TICKS: u64 = 60;

/// The TTL decay loop: one pass over the whole cache per second for the
/// lifetime of the proxy, until cancelled.
pub struct TtlSweeper {
    store: Arc<CacheStore>,
    queue: mpsc::Sender<RefreshTask>,
    policy: RefreshPolicy,
    shutdown: CancellationToken,
}

impl TtlSweeper {
    pub fn new(store: Arc<CacheStore>, queue: mpsc::Sender<RefreshTask>, policy: RefreshPolicy) -> Self {
        Self {
            store,
            queue,
            policy,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        info!(
            refresh_threshold = self.policy.threshold,
            refresh_max_age_secs = self.policy.max_age.as_secs(),
            "TTL sweeper started"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // A stalled tick must not replay as a burst of extra decrements.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("TTL sweeper: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let stats = self.store.sweep(&self.queue, &self.policy);

                        if stats.scheduled > 0 || stats.evicted > 0 || stats.dropped > 0 {
                            debug!(
                                scheduled = stats.scheduled,
                                evicted = stats.evicted,
                                dropped = stats.dropped,
                                cache_size = self.store.len(),
                                "Sweep completed"
                            );
                        }

                        ticks += 1;
                        if ticks % STATS_EVERY_TICKS == 0 {
                            let metrics = self.store.metrics();
                            info!(
                                cache_size = self.store.len(),
                                hit_rate = format!("{:.1}%", metrics.hit_rate()),
                                "Cache stats"
                            );
                        }
                    }
                }
            }
        })
    }
}
