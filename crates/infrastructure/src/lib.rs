//! Warren DNS infrastructure layer: the cache engine, wire codec helpers,
//! the upstream client, and the inbound listeners.

pub mod dns;
