use super::store::{CacheStore, RefreshTask};
use crate::dns::wire;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warren_dns_application::UpstreamResolver;

/// Fixed pool of workers draining the refresh queue. Each worker re-issues
/// one entry's query upstream and installs the fresh answer; every outcome,
/// success or not, leaves the entry in a consistent state.
pub struct RefreshPool {
    store: Arc<CacheStore>,
    upstream: Arc<dyn UpstreamResolver>,
    workers: usize,
    query_timeout: Duration,
    shutdown: CancellationToken,
}

impl RefreshPool {
    pub fn new(
        store: Arc<CacheStore>,
        upstream: Arc<dyn UpstreamResolver>,
        workers: usize,
        query_timeout: Duration,
    ) -> Self {
        Self {
            store,
            upstream,
            workers,
            query_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Spawn the workers on a shared receiver. Each exits when cancelled or
    /// when the queue closes.
    pub fn spawn(self, queue: mpsc::Receiver<RefreshTask>) -> Vec<tokio::task::JoinHandle<()>> {
        info!(workers = self.workers, "Refresh worker pool started");

        let queue = Arc::new(Mutex::new(queue));

        (0..self.workers)
            .map(|worker_id| {
                let store = Arc::clone(&self.store);
                let upstream = Arc::clone(&self.upstream);
                let queue = Arc::clone(&queue);
                let shutdown = self.shutdown.clone();
                let timeout = self.query_timeout;

                tokio::spawn(async move {
                    loop {
                        let task = tokio::select! {
                            _ = shutdown.cancelled() => break,
                            task = async { queue.lock().await.recv().await } => match task {
                                Some(task) => task,
                                None => break,
                            },
                        };

                        Self::refresh_entry(&store, upstream.as_ref(), task, timeout).await;
                    }

                    debug!(worker_id, "Refresh worker stopped");
                })
            })
            .collect()
    }

    async fn refresh_entry(
        store: &CacheStore,
        upstream: &dyn UpstreamResolver,
        task: RefreshTask,
        timeout: Duration,
    ) {
        let RefreshTask { key, request } = task;

        let request_wire = match wire::serialize(&request) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(name = %key.name, error = %e, "Failed to serialize refresh query");
                store.metrics().refresh_failures.fetch_add(1, Ordering::Relaxed);
                store.finish_refresh(&key);
                return;
            }
        };

        match upstream.query(&request_wire, timeout).await {
            Ok(reply_wire) => match wire::parse(&reply_wire) {
                Ok(reply) if !reply.answers().is_empty() => {
                    debug!(
                        name = %key.name,
                        record_type = %key.record_type,
                        "Cache entry refreshed"
                    );
                    store.metrics().refreshes.fetch_add(1, Ordering::Relaxed);
                    store.insert(key, request, reply);
                }
                Ok(_) => {
                    warn!(
                        name = %key.name,
                        record_type = %key.record_type,
                        "Refresh returned no answers, keeping stale entry"
                    );
                    store.metrics().refresh_failures.fetch_add(1, Ordering::Relaxed);
                    store.finish_refresh(&key);
                }
                Err(e) => {
                    warn!(name = %key.name, error = %e, "Failed to parse refresh reply");
                    store.metrics().refresh_failures.fetch_add(1, Ordering::Relaxed);
                    store.finish_refresh(&key);
                }
            },
            Err(e) => {
                warn!(
                    name = %key.name,
                    record_type = %key.record_type,
                    error = %e,
                    "Refresh query failed, keeping stale entry"
                );
                store.metrics().refresh_failures.fetch_add(1, Ordering::Relaxed);
                store.finish_refresh(&key);
            }
        }
    }
}
