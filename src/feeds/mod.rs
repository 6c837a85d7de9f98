//! Live data sources for the lot. Each feed turns some upstream (a simulated
//! pub/sub topic, a polled HTTP endpoint) into a stream of delta batches, so
//! a real sensor backend can replace a simulator without touching the code
//! that applies the deltas.

use futures::stream::BoxStream;
use crate::models::{Reading, SlotStatus};

mod http_poll;
mod pubsub;

pub use http_poll::{deltas_from_devices, HttpPollFeed};
pub use pubsub::PubSubSimulator;

/// One observed change for a slot or its sensor. `slot_id` may also be a
/// sensor id; consumers resolve it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDelta {
    pub slot_id: String,
    pub status: Option<SlotStatus>,
    pub reading: Option<Reading>,
}

/// Deltas observed in one tick of a feed.
pub type DeltaBatch = Vec<SlotDelta>;

pub trait SlotFeed: Send {
    fn name(&self) -> &'static str;

    /// Consumes the feed and yields one batch per tick. Ticks that produce
    /// nothing may yield an empty batch.
    fn updates(self: Box<Self>) -> BoxStream<'static, DeltaBatch>;
}
