//! Event bus port
//!
//! The bus itself lives outside this crate; the service only needs a way
//! to publish outcome events.

mod publisher;

pub use publisher::{ChannelPublisher, EventPublisher};
