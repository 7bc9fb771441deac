//! Warren DNS application layer: the trait seams between the cache engine
//! and its collaborators.

pub mod ports;

pub use ports::UpstreamResolver;
