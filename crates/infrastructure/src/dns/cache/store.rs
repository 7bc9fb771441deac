use super::entry::{CacheEntry, MAX_REFRESH_ATTEMPTS};
use super::key::CacheKey;
use super::metrics::CacheMetrics;
use hickory_proto::op::Message;
use rustc_hash::FxHashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Refresh-ahead tuning, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Seconds-to-live at which an entry becomes eligible for refresh.
    pub threshold: u32,
    /// An entry is only refreshed if it was read within this window.
    pub max_age: Duration,
}

/// One unit of work for the refresh pool: the key plus a clone of the
/// ID-bumped request. The store keeps ownership of the entry itself.
#[derive(Debug)]
pub struct RefreshTask {
    pub key: CacheKey,
    pub request: Message,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub scheduled: usize,
    pub evicted: usize,
    pub dropped: usize,
}

/// The cache map. One mutex guards the whole thing: lookups, inserts, and
/// the sweeper's full pass all serialize on it, which rules out any lock
/// ordering between the sweeper and concurrent query handlers. Nothing
/// holds the lock across I/O.
pub struct CacheStore {
    entries: Mutex<FxHashMap<CacheKey, CacheEntry>>,
    max_cache_ttl: Option<u32>,
    metrics: Arc<CacheMetrics>,
}

impl CacheStore {
    pub fn new(max_cache_ttl: Option<u32>) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            max_cache_ttl,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Clone of the decayed reply for a cached key. Updates `last_access`.
    /// The caller owns rewriting the transaction ID to its own query's.
    pub fn lookup(&self, key: &CacheKey) -> Option<Message> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);

                debug!(
                    name = %key.name,
                    record_type = %key.record_type,
                    ttl = entry.ttl(),
                    "Cache hit"
                );

                Some(entry.reply.clone())
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Install a fresh answer for `key`, replacing any existing entry and
    /// resetting its refresh state. Replies without answer records are never
    /// cached: NXDOMAIN and empty answers go straight back to the caller.
    pub fn insert(&self, key: CacheKey, request: Message, mut reply: Message) {
        if reply.answers().is_empty() {
            self.metrics.rejected_inserts.fetch_add(1, Ordering::Relaxed);
            debug!(
                name = %key.name,
                record_type = %key.record_type,
                "Answerless reply not cached"
            );
            return;
        }

        if let Some(ceiling) = self.max_cache_ttl {
            for section in [Message::answers_mut, Message::additionals_mut] {
                for record in section(&mut reply) {
                    record.set_ttl(record.ttl().min(ceiling));
                }
            }
        }

        let mut entries = self.entries.lock().unwrap();
        let entry = CacheEntry::new(request, reply);

        debug!(
            name = %key.name,
            record_type = %key.record_type,
            ttl = entry.ttl(),
            cache_size = entries.len() + 1,
            "Inserted into cache"
        );

        entries.insert(key, entry);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Clear `refreshing` after a failed refresh. The stale entry stays in
    /// place; the sweeper may offer it once more before it expires.
    pub fn finish_refresh(&self, key: &CacheKey) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.refreshing = false;
        }
    }

    /// One full decay pass. For each entry, in order:
    ///
    /// 1. Inside the refresh window, recently read, not already refreshing,
    ///    and with attempts left: mark refreshing, bump the stored request's
    ///    transaction ID, and offer it to the pool without blocking. A full
    ///    queue reverts the marking; the entry keeps decaying and may be
    ///    offered again next tick.
    /// 2. Expired and not refreshing: evict. `refreshing == true` pins the
    ///    entry even at TTL 0.
    /// 3. Otherwise: decrement every record TTL by one second.
    pub fn sweep(&self, queue: &mpsc::Sender<RefreshTask>, policy: &RefreshPolicy) -> SweepStats {
        let now = Instant::now();
        let mut stats = SweepStats::default();
        let mut expired = Vec::new();

        let mut entries = self.entries.lock().unwrap();

        for (key, entry) in entries.iter_mut() {
            let ttl = entry.ttl();

            if !entry.refreshing
                && ttl > 0
                && ttl <= policy.threshold
                && entry.refresh_attempts < MAX_REFRESH_ATTEMPTS
                && now.duration_since(entry.last_access) < policy.max_age
            {
                entry.refreshing = true;
                entry.refresh_attempts += 1;
                let id = entry.request.id().wrapping_add(1);
                let mut header = *entry.request.header();
                header.set_id(id);
                entry.request.set_header(header);

                let task = RefreshTask {
                    key: key.clone(),
                    request: entry.request.clone(),
                };

                match queue.try_send(task) {
                    Ok(()) => {
                        stats.scheduled += 1;
                        self.metrics
                            .refresh_submissions
                            .fetch_add(1, Ordering::Relaxed);
                        debug!(name = %key.name, ttl, "Scheduled refresh-ahead");
                    }
                    Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                        // A drop does not consume a retry attempt, and the
                        // entry keeps decaying toward natural expiry.
                        entry.refreshing = false;
                        entry.refresh_attempts -= 1;
                        entry.decay();
                        stats.dropped += 1;
                        self.metrics.queue_full_drops.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            name = %key.name,
                            record_type = %key.record_type,
                            "Refresh queue full, skipping refresh this tick"
                        );
                    }
                }
            } else if ttl == 0 && !entry.refreshing {
                expired.push(key.clone());
            } else {
                entry.decay();
            }
        }

        for key in expired {
            entries.remove(&key);
            stats.evicted += 1;
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(name = %key.name, record_type = %key.record_type, "Evicted expired entry");
        }

        stats
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }
}
