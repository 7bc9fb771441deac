use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::RecordType;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use warren_dns_infrastructure::dns::cache::CacheStore;
use warren_dns_infrastructure::dns::server::QueryHandler;
use warren_dns_infrastructure::dns::wire;

mod helpers;
use helpers::{make_query, MockBehavior, MockUpstream};

fn handler_with(
    store: &Arc<CacheStore>,
    upstream: &Arc<MockUpstream>,
    cache_enabled: bool,
) -> QueryHandler {
    QueryHandler::new(
        Arc::clone(store),
        Arc::clone(upstream) as Arc<dyn warren_dns_application::UpstreamResolver>,
        Duration::from_millis(500),
        cache_enabled,
    )
}

async fn ask(handler: &QueryHandler, id: u16, domain: &str, record_type: RecordType) -> Message {
    let packet = wire::serialize(&make_query(id, domain, record_type)).unwrap();
    let reply = handler.handle(&packet).await.expect("handler answers");
    wire::parse(&reply).unwrap()
}

#[tokio::test]
async fn miss_resolves_upstream_and_caches() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10), 120));
    let handler = handler_with(&store, &upstream, true);

    let reply = ask(&handler, 0x1234, "db.internal.", RecordType::A).await;

    assert_eq!(reply.id(), 0x1234);
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert_eq!(reply.answers().len(), 1);
    assert_eq!(reply.answers()[0].ttl(), 120);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn hit_is_served_from_cache_with_the_callers_id() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10), 120));
    let handler = handler_with(&store, &upstream, true);

    ask(&handler, 0x1111, "db.internal.", RecordType::A).await;
    let reply = ask(&handler, 0x9999, "db.internal.", RecordType::A).await;

    // Served from cache: the reply carries the second caller's ID and the
    // upstream saw only the first query.
    assert_eq!(reply.id(), 0x9999);
    assert_eq!(reply.answers()[0].ttl(), 120);
    assert_eq!(upstream.query_count(), 1);
}

#[tokio::test]
async fn record_types_are_distinct_cache_entries() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10), 120));
    let handler = handler_with(&store, &upstream, true);

    ask(&handler, 1, "svc.internal.", RecordType::A).await;

    upstream.set_behavior(MockBehavior::Srv { port: 8443, ttl: 60 });
    let reply = ask(&handler, 2, "svc.internal.", RecordType::SRV).await;

    assert_eq!(reply.answers()[0].record_type(), RecordType::SRV);
    assert_eq!(store.len(), 2);
    assert_eq!(upstream.query_count(), 2);
}

#[tokio::test]
async fn upstream_failure_yields_servfail_and_no_insert() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::failing());
    let handler = handler_with(&store, &upstream, true);

    let reply = ask(&handler, 0x4242, "down.internal.", RecordType::A).await;

    assert_eq!(reply.id(), 0x4242);
    assert_eq!(reply.response_code(), ResponseCode::ServFail);
    assert!(store.is_empty());
}

#[tokio::test]
async fn nxdomain_passes_through_uncached() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::new(MockBehavior::NxDomain));
    let handler = handler_with(&store, &upstream, true);

    let reply = ask(&handler, 7, "ghost.internal.", RecordType::A).await;
    assert_eq!(reply.response_code(), ResponseCode::NXDomain);
    assert!(store.is_empty());

    // Not cached, so the second query reaches upstream again.
    ask(&handler, 8, "ghost.internal.", RecordType::A).await;
    assert_eq!(upstream.query_count(), 2);
}

#[tokio::test]
async fn answerless_noerror_is_not_cached() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::new(MockBehavior::Empty));
    let handler = handler_with(&store, &upstream, true);

    let reply = ask(&handler, 9, "empty.internal.", RecordType::AAAA).await;

    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert!(reply.answers().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn disabled_cache_forwards_every_query() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::answering(Ipv4Addr::new(192, 0, 2, 10), 120));
    let handler = handler_with(&store, &upstream, false);

    ask(&handler, 1, "db.internal.", RecordType::A).await;
    ask(&handler, 2, "db.internal.", RecordType::A).await;

    assert_eq!(upstream.query_count(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_question_section_gets_formerr() {
    let store = Arc::new(CacheStore::new(None));
    let upstream = Arc::new(MockUpstream::failing());
    let handler = handler_with(&store, &upstream, true);

    let bare = Message::new(0x0b0b, MessageType::Query, OpCode::Query);
    let packet = wire::serialize(&bare).unwrap();

    let reply = wire::parse(&handler.handle(&packet).await.unwrap()).unwrap();
    assert_eq!(reply.response_code(), ResponseCode::FormErr);
    assert_eq!(upstream.query_count(), 0);
}
