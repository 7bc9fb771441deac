//! Wire-format helpers built on `hickory-proto`. The cache and handler work
//! with parsed `Message`s; everything crossing a socket goes through here.

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use warren_dns_domain::DnsError;

pub fn serialize(message: &Message) -> Result<Vec<u8>, DnsError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);

    message
        .emit(&mut encoder)
        .map_err(|e| DnsError::WireFormat(format!("Failed to serialize DNS message: {}", e)))?;

    Ok(buf)
}

pub fn parse(bytes: &[u8]) -> Result<Message, DnsError> {
    Message::from_vec(bytes)
        .map_err(|e| DnsError::WireFormat(format!("Failed to parse DNS message: {}", e)))
}

/// Response carrying only a response code, echoing the request's ID, opcode,
/// and question section. Used for SERVFAIL/FORMERR/NOTIMP replies.
pub fn error_response(request: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new(request.id(), MessageType::Response, request.op_code());
    response.set_response_code(code);
    response.set_recursion_desired(request.recursion_desired());
    response.set_recursion_available(true);

    for query in request.queries() {
        response.add_query(query.clone());
    }

    response
}
