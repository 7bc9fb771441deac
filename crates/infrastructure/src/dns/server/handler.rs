use crate::dns::cache::{CacheKey, CacheStore};
use crate::dns::wire;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use warren_dns_application::UpstreamResolver;
use warren_dns_domain::DnsError;

/// Answers one inbound query: from the cache when possible, otherwise by
/// forwarding upstream and caching a successful answer.
pub struct QueryHandler {
    store: Arc<CacheStore>,
    upstream: Arc<dyn UpstreamResolver>,
    query_timeout: Duration,
    cache_enabled: bool,
}

impl QueryHandler {
    pub fn new(
        store: Arc<CacheStore>,
        upstream: Arc<dyn UpstreamResolver>,
        query_timeout: Duration,
        cache_enabled: bool,
    ) -> Self {
        Self {
            store,
            upstream,
            query_timeout,
            cache_enabled,
        }
    }

    /// Handle one wire-format query and produce the wire-format reply.
    /// Returns `None` for packets that cannot be answered at all
    /// (unparseable, or not a query).
    pub async fn handle(&self, packet: &[u8]) -> Option<Vec<u8>> {
        let request = match wire::parse(packet) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Dropping unparseable packet");
                return None;
            }
        };

        if request.message_type() != MessageType::Query {
            return None;
        }

        if request.op_code() != OpCode::Query {
            return wire::serialize(&wire::error_response(&request, ResponseCode::NotImp)).ok();
        }

        let query = match request.queries().first() {
            Some(query) => query.clone(),
            None => {
                return wire::serialize(&wire::error_response(&request, ResponseCode::FormErr))
                    .ok();
            }
        };

        let key = CacheKey::from(&query);

        if self.cache_enabled {
            if let Some(mut reply) = self.store.lookup(&key) {
                // The cached reply carries whatever ID it was stored under;
                // the client gets its own back.
                let mut header = *reply.header();
                header.set_id(request.id());
                reply.set_header(header);
                return wire::serialize(&reply).ok();
            }
        }

        match self.forward(&request).await {
            Ok(mut reply) => {
                let mut header = *reply.header();
                header.set_id(request.id());
                reply.set_header(header);
                let reply_wire = wire::serialize(&reply).ok();

                if self.cache_enabled
                    && reply.response_code() == ResponseCode::NoError
                    && !reply.answers().is_empty()
                {
                    self.store.insert(key, request, reply);
                }

                reply_wire
            }
            Err(e) => {
                warn!(
                    name = %query.name(),
                    record_type = %query.query_type(),
                    error = %e,
                    "Upstream resolution failed"
                );
                wire::serialize(&wire::error_response(&request, ResponseCode::ServFail)).ok()
            }
        }
    }

    /// Forward upstream under a fresh transaction ID; the client's ID is
    /// restored on the reply by the caller.
    async fn forward(&self, request: &Message) -> Result<Message, DnsError> {
        let mut outbound = request.clone();
        let mut header = *outbound.header();
        header.set_id(fastrand::u16(..));
        outbound.set_header(header);

        let request_wire = wire::serialize(&outbound)?;
        let reply_wire = self.upstream.query(&request_wire, self.query_timeout).await?;
        let reply = wire::parse(&reply_wire)?;

        if reply.id() != outbound.id() {
            return Err(DnsError::WireFormat(
                "Reply transaction ID does not match the query".to_string(),
            ));
        }

        Ok(reply)
    }
}
