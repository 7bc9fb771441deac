use hickory_proto::op::Message;
use std::time::Instant;

/// Submissions allowed per decay cycle: the initial refresh plus one retry
/// after a failed attempt. Reset whenever a fresh reply is installed.
pub(crate) const MAX_REFRESH_ATTEMPTS: u8 = 2;

/// A cached answer. Owned exclusively by the store while present in the map.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// The original query message. Its transaction ID is bumped in place
    /// when a refresh is issued, so it is never handed out by reference.
    pub(crate) request: Message,

    /// The most recent successful reply. Record TTLs are decremented in
    /// place by the sweeper, so a lookup clone is already decayed.
    pub(crate) reply: Message,

    /// Updated on every lookup served. Gates refresh-ahead eligibility.
    pub(crate) last_access: Instant,

    /// True exactly while a refresh for this entry sits in the worker queue
    /// or in flight. Blocks eviction and duplicate submissions.
    pub(crate) refreshing: bool,

    pub(crate) refresh_attempts: u8,
}

impl CacheEntry {
    pub(crate) fn new(request: Message, reply: Message) -> Self {
        Self {
            request,
            reply,
            last_access: Instant::now(),
            refreshing: false,
            refresh_attempts: 0,
        }
    }

    /// The entry's expiry clock: remaining TTL of the first answer record.
    /// All records in the reply decay in lockstep with it.
    pub(crate) fn ttl(&self) -> u32 {
        self.reply.answers().first().map(|r| r.ttl()).unwrap_or(0)
    }

    /// One second of decay across the answer and additional sections.
    pub(crate) fn decay(&mut self) {
        for section in [Message::answers_mut, Message::additionals_mut] {
            for record in section(&mut self.reply) {
                record.set_ttl(record.ttl().saturating_sub(1));
            }
        }
    }
}
