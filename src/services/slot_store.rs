use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use crate::errors::{AppError, AppResult};
use crate::models::{Owner, ReservationForm, Slot, SlotStatus};
use super::persistence::PersistedValue;

/// Acknowledgement returned by the mock reserve/free calls. `ok` is always
/// true; `applied` tells whether a slot with that id existed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SlotAck {
    pub ok: bool,
    pub applied: bool,
}

/// Anything a poller can read a slot snapshot from.
#[async_trait]
pub trait SlotSource: Send + Sync {
    async fn fetch_slots(&self) -> AppResult<Vec<Slot>>;
}

/// The in-memory slot snapshot for one lot. Cloning shares the same state,
/// so the handle is passed explicitly to every component that reads or
/// mutates it.
#[derive(Clone)]
pub struct SlotStore {
    slots: Arc<RwLock<Vec<Slot>>>,
    latency: Duration,
    persist_lock: Arc<Mutex<()>>,
}

impl SlotStore {
    pub fn new(slots: Vec<Slot>, latency: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(slots)),
            latency,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }

    pub async fn get_slots(&self) -> Vec<Slot> {
        self.simulate_latency().await;
        self.snapshot().await
    }

    /// Current snapshot without the simulated round trip.
    pub async fn snapshot(&self) -> Vec<Slot> {
        self.slots.read().await.clone()
    }

    /// Writes the current snapshot. Concurrent callers are serialised so
    /// the last write always carries the latest state.
    pub async fn persist(&self, target: &PersistedValue<Vec<Slot>>) {
        let _guard = self.persist_lock.lock().await;
        target.save(&self.snapshot().await).await;
    }

    pub async fn slot(&self, slot_id: &str) -> Option<Slot> {
        self.slots.read().await.iter().find(|s| s.id == slot_id).cloned()
    }

    pub async fn replace_all(&self, slots: Vec<Slot>) {
        *self.slots.write().await = slots;
    }

    pub async fn reserve_slot(&self, slot_id: &str) -> SlotAck {
        self.simulate_latency().await;
        self.ack(slot_id, self.update_slot_status(slot_id, SlotStatus::Occupied).await)
    }

    pub async fn free_slot(&self, slot_id: &str) -> SlotAck {
        self.simulate_latency().await;
        self.ack(slot_id, self.update_slot_status(slot_id, SlotStatus::Free).await)
    }

    fn ack(&self, slot_id: &str, applied: bool) -> SlotAck {
        if !applied {
            tracing::debug!("No slot {}, nothing to update", slot_id);
        }
        SlotAck { ok: true, applied }
    }

    /// Reserves a free slot on behalf of a named driver.
    pub async fn reserve_slot_for(&self, slot_id: &str, form: ReservationForm) -> AppResult<Slot> {
        if form.full_name.trim().is_empty() {
            return Err(AppError::MissingField("full_name"));
        }
        if form.email.trim().is_empty() {
            return Err(AppError::MissingField("email"));
        }

        self.simulate_latency().await;
        let mut slots = self.slots.write().await;
        let slot = slots
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| AppError::SlotNotFound(slot_id.to_string()))?;

        if !slot.is_free() {
            return Err(AppError::SlotUnavailable(slot_id.to_string()));
        }

        let owner = Owner {
            full_name: form.full_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone,
            car_number: form.car_number,
            notes: form.notes,
            parked_at: None,
            reserved_at: None,
        };
        slot.reserve(owner, Utc::now());
        tracing::info!("Slot {} reserved", slot_id);
        Ok(slot.clone())
    }

    /// Unconditional overwrite used by live feeds. Returns whether a slot
    /// with that id exists.
    pub async fn update_slot_status(&self, slot_id: &str, status: SlotStatus) -> bool {
        let mut slots = self.slots.write().await;
        match slots.iter_mut().find(|s| s.id == slot_id) {
            Some(slot) => {
                tracing::debug!("Slot {}: {} -> {}", slot_id, slot.status, status);
                slot.set_status(status, Utc::now());
                true
            }
            None => false,
        }
    }

    pub async fn set_distance(&self, slot_id: &str, distance_cm: f64) -> bool {
        let mut slots = self.slots.write().await;
        match slots.iter_mut().find(|s| s.id == slot_id) {
            Some(slot) => {
                slot.distance_cm = Some(distance_cm);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SlotSource for SlotStore {
    async fn fetch_slots(&self) -> AppResult<Vec<Slot>> {
        Ok(self.get_slots().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::static_lot;
    use crate::services::{KeyValueStore, MemoryStore, SLOT_DATA_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // The first write stalls, so a later writer could overtake it.
    #[derive(Default)]
    struct StallingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for StallingStore {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> AppResult<()> {
            if self.writes.fetch_add(1, Ordering::SeqCst) == 0 {
                sleep(Duration::from_millis(100)).await;
            }
            self.inner.set(key, value).await
        }
    }

    fn store() -> SlotStore {
        SlotStore::new(static_lot(Utc::now()).slots, Duration::ZERO)
    }

    async fn status_of(store: &SlotStore, id: &str) -> SlotStatus {
        store
            .get_slots()
            .await
            .into_iter()
            .find(|s| s.id == id)
            .map(|s| s.status)
            .unwrap()
    }

    #[tokio::test]
    async fn reserve_then_free_round_trips_status() {
        let store = store();
        for slot in store.get_slots().await {
            let ack = store.reserve_slot(&slot.id).await;
            assert_eq!(ack, SlotAck { ok: true, applied: true });
            assert_eq!(status_of(&store, &slot.id).await, SlotStatus::Occupied);

            store.free_slot(&slot.id).await;
            assert_eq!(status_of(&store, &slot.id).await, SlotStatus::Free);
        }
        assert!(store.get_slots().await.iter().all(|s| s.owner.is_none()));
    }

    #[tokio::test]
    async fn unknown_slot_is_a_successful_no_op() {
        let store = store();
        let before = store.get_slots().await;

        assert_eq!(store.reserve_slot("Z9").await, SlotAck { ok: true, applied: false });
        assert_eq!(store.free_slot("Z9").await, SlotAck { ok: true, applied: false });
        assert_eq!(store.get_slots().await, before);
    }

    #[tokio::test]
    async fn reservation_requires_a_free_slot() {
        let store = store();
        let form = ReservationForm {
            full_name: "Grant Sanderson".into(),
            email: "grant@example.com".into(),
            car_number: Some("KA01AB0001".into()),
            ..ReservationForm::default()
        };

        let slot = store.reserve_slot_for("A2", form.clone()).await.unwrap();
        assert_eq!(slot.status, SlotStatus::Reserved);
        assert_eq!(slot.owner.unwrap().full_name, "Grant Sanderson");

        assert!(matches!(
            store.reserve_slot_for("A2", form.clone()).await,
            Err(AppError::SlotUnavailable(_))
        ));
        assert!(matches!(
            store.reserve_slot_for("Z9", form).await,
            Err(AppError::SlotNotFound(_))
        ));
        assert!(matches!(
            store.reserve_slot_for("A4", ReservationForm::default()).await,
            Err(AppError::MissingField("full_name"))
        ));
    }

    #[tokio::test]
    async fn replace_all_swaps_the_whole_lot() {
        let store = store();
        let mut restored = vec![Slot::new("E1", "E1")];
        restored[0].set_status(SlotStatus::Occupied, Utc::now());

        store.replace_all(restored.clone()).await;
        assert_eq!(store.snapshot().await, restored);
        assert!(store.slot("A1").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reads_pay_the_simulated_latency() {
        let store = SlotStore::new(static_lot(Utc::now()).slots, Duration::from_millis(200));
        let started = tokio::time::Instant::now();
        store.get_slots().await;
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_persists_keep_the_latest_snapshot() {
        let store = store();
        let target = PersistedValue::new(Arc::new(StallingStore::default()), SLOT_DATA_KEY);

        let first = tokio::spawn({
            let (store, target) = (store.clone(), target.clone());
            async move { store.persist(&target).await }
        });
        sleep(Duration::from_millis(10)).await;

        store.update_slot_status("A2", SlotStatus::Occupied).await;
        store.persist(&target).await;
        first.await.unwrap();

        let saved = target.try_load().await.unwrap().unwrap();
        assert_eq!(saved, store.snapshot().await);
        assert!(saved.iter().any(|s| s.id == "A2" && s.status == SlotStatus::Occupied));
    }
}
