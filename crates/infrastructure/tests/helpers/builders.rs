use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use std::str::FromStr;

/// Build a recursive query message for `domain` with the given ID.
pub fn make_query(id: u16, domain: &str, record_type: RecordType) -> Message {
    let mut query = Query::new();
    query.set_name(Name::from_str(domain).expect("valid test domain"));
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);
    message
}

/// Build a one-answer A reply for `request`.
pub fn make_reply(request: &Message, ttl: u32) -> Message {
    let query = request.queries()[0].clone();

    let mut reply = Message::new(request.id(), MessageType::Response, OpCode::Query);
    reply.set_recursion_available(true);
    reply.add_answer(Record::from_rdata(
        query.name().clone(),
        ttl,
        RData::A(A::new(192, 0, 2, 1)),
    ));
    reply.add_query(query);
    reply
}
