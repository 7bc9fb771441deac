use async_trait::async_trait;
use bytes::Bytes;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, SRV};
use hickory_proto::rr::{Name, RData, Record};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use warren_dns_application::UpstreamResolver;
use warren_dns_domain::DnsError;
use warren_dns_infrastructure::dns::wire;

/// What the mock nameserver does with the next query.
#[derive(Clone, Copy)]
pub enum MockBehavior {
    /// NOERROR with one A answer.
    Answer { addr: Ipv4Addr, ttl: u32 },
    /// NOERROR with one SRV answer pointing at `port`.
    Srv { port: u16, ttl: u32 },
    /// NOERROR with an empty answer section.
    Empty,
    NxDomain,
    /// Transport-level failure.
    Fail,
}

/// In-memory stand-in for the upstream nameserver list.
pub struct MockUpstream {
    behavior: Mutex<MockBehavior>,
    queries: AtomicU64,
}

impl MockUpstream {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            queries: AtomicU64::new(0),
        }
    }

    pub fn answering(addr: Ipv4Addr, ttl: u32) -> Self {
        Self::new(MockBehavior::Answer { addr, ttl })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Fail)
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamResolver for MockUpstream {
    async fn query(&self, request: &[u8], _timeout: Duration) -> Result<Bytes, DnsError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let request = wire::parse(request).expect("mock received invalid wire data");
        let behavior = *self.behavior.lock().unwrap();

        if let MockBehavior::Fail = behavior {
            return Err(DnsError::UpstreamUnreachable);
        }

        let query = request.queries()[0].clone();
        let mut reply = Message::new(request.id(), MessageType::Response, OpCode::Query);
        reply.set_recursion_available(true);

        match behavior {
            MockBehavior::Answer { addr, ttl } => {
                reply.add_answer(Record::from_rdata(query.name().clone(), ttl, RData::A(A(addr))));
            }
            MockBehavior::Srv { port, ttl } => {
                let target = Name::from_str("node-0.internal.").unwrap();
                reply.add_answer(Record::from_rdata(
                    query.name().clone(),
                    ttl,
                    RData::SRV(SRV::new(0, 5, port, target)),
                ));
            }
            MockBehavior::NxDomain => {
                reply.set_response_code(ResponseCode::NXDomain);
            }
            MockBehavior::Empty => {}
            MockBehavior::Fail => unreachable!(),
        }

        reply.add_query(query);

        let bytes = wire::serialize(&reply).expect("mock reply serializes");
        Ok(Bytes::from(bytes))
    }
}
