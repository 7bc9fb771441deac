#![allow(dead_code)]

pub mod builders;
pub mod mock_upstream;

pub use builders::{make_query, make_reply};
pub use mock_upstream::{MockBehavior, MockUpstream};
