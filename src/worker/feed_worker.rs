use chrono::Utc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use crate::feeds::{SlotDelta, SlotFeed};
use crate::models::Slot;
use crate::poller::RefreshRegistry;
use crate::services::{PersistedValue, SensorBoard, SlotStore};

/// Everything a feed is allowed to touch.
#[derive(Clone)]
pub struct FeedContext {
    pub store: SlotStore,
    pub sensors: SensorBoard,
    pub registry: RefreshRegistry,
    pub snapshot: Option<PersistedValue<Vec<Slot>>>,
}

/// Drains one feed until it ends or `cancel` fires.
pub async fn feed_process(
    feed: Box<dyn SlotFeed>,
    ctx: FeedContext,
    cancel: CancellationToken,
) {
    let name = feed.name();
    tracing::info!("Feed {} started", name);
    let mut updates = feed.updates();

    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            next = updates.next() => match next {
                Some(batch) => batch,
                None => {
                    tracing::warn!("Feed {} ended", name);
                    break;
                }
            },
        };

        if batch.is_empty() {
            continue;
        }

        let applied = apply_batch(&ctx, &batch).await;
        tracing::debug!("Feed {}: applied {} of {} deltas", name, applied, batch.len());

        if applied > 0 {
            if let Some(snapshot) = &ctx.snapshot {
                ctx.store.persist(snapshot).await;
            }
            ctx.registry.refresh_now();
        }
    }

    tracing::info!("Feed {} stopped", name);
}

/// Applies a batch in order. Readings go to the sensor board first so a
/// sensor id can be resolved to its slot; the status then overwrites the
/// slot. Later deltas for the same slot win. Returns the number of deltas
/// that changed anything.
pub async fn apply_batch(ctx: &FeedContext, batch: &[SlotDelta]) -> usize {
    let readings: Vec<_> = batch
        .iter()
        .filter_map(|d| d.reading.map(|r| (d.slot_id.clone(), r)))
        .collect();

    let mut resolved = Vec::new().into_iter();
    if !readings.is_empty() {
        resolved = ctx.sensors.merge_readings(&readings, Utc::now()).await.into_iter();
    }

    let mut applied = 0;
    for delta in batch {
        let mut slot_id = delta.slot_id.clone();
        let mut changed = false;

        if let Some(reading) = delta.reading {
            if let Some(Some(owner)) = resolved.next() {
                slot_id = owner;
                changed = true;
            }
            changed |= ctx.store.set_distance(&slot_id, reading.distance_cm).await;
        }
        if let Some(status) = delta.status {
            changed |= ctx.store.update_slot_status(&slot_id, status).await;
        }

        if changed {
            applied += 1;
        } else {
            tracing::warn!("Update for unknown slot {} ignored", delta.slot_id);
        }
    }
    applied
}
