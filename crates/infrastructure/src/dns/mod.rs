pub mod cache;
pub mod server;
pub mod upstream;
pub mod wire;

pub use upstream::UdpUpstream;
