//! Inbound DNS serving: the request handler plus the UDP and TCP listeners.

pub mod handler;
pub mod tcp;
pub mod udp;

pub use handler::QueryHandler;
pub use tcp::serve_tcp;
pub use udp::serve_udp;
