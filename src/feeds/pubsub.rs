use futures::stream::{self, BoxStream, StreamExt};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use crate::config::timer_period;
use crate::models::SlotStatus;
use super::{DeltaBatch, SlotDelta, SlotFeed};

/// Stands in for an MQTT topic: every tick one slot from a fixed pool flips
/// to a random free/occupied state.
pub struct PubSubSimulator {
    pool: Vec<String>,
    every: Duration,
    rng: StdRng,
}

impl PubSubSimulator {
    pub fn new(pool: Vec<String>, every: Duration) -> Self {
        Self::with_rng(pool, every, StdRng::from_entropy())
    }

    pub fn seeded(pool: Vec<String>, every: Duration, seed: u64) -> Self {
        Self::with_rng(pool, every, StdRng::seed_from_u64(seed))
    }

    fn with_rng(pool: Vec<String>, every: Duration, rng: StdRng) -> Self {
        Self { pool, every: timer_period(every), rng }
    }

    pub fn next_delta(&mut self) -> Option<SlotDelta> {
        if self.pool.is_empty() {
            return None;
        }
        let slot_id = self.pool[self.rng.gen_range(0..self.pool.len())].clone();
        let status = if self.rng.gen_bool(0.5) {
            SlotStatus::Free
        } else {
            SlotStatus::Occupied
        };
        tracing::info!("[FakeMQTT] Simulated update -> {} = {}", slot_id, status);
        Some(SlotDelta {
            slot_id,
            status: Some(status),
            reading: None,
        })
    }
}

impl SlotFeed for PubSubSimulator {
    fn name(&self) -> &'static str {
        "pubsub-simulator"
    }

    fn updates(self: Box<Self>) -> BoxStream<'static, DeltaBatch> {
        tracing::info!("[FakeMQTT] Starting simulated sensor feed...");
        // First message arrives one period after start.
        let ticker = interval_at(Instant::now() + self.every, self.every);
        stream::unfold((ticker, self), |(mut ticker, mut feed)| async move {
            ticker.tick().await;
            let batch: DeltaBatch = feed.next_delta().into_iter().collect();
            Some((batch, (ticker, feed)))
        })
        .boxed()
    }
}
