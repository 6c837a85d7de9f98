use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use crate::config::timer_period;
use crate::models::Slot;
use crate::services::SlotSource;
use super::registry::{RefreshRegistry, SubscriberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Mounting,
    Fetching,
    Idle,
    Unmounting,
    Unmounted,
}

/// What a mounted view renders: the latest slot list plus loading state.
#[derive(Debug, Clone)]
pub struct PollState {
    pub slots: Vec<Slot>,
    pub loading: bool,
    pub phase: PollPhase,
    pub fetches: u64,
    pub last_error: Option<String>,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            loading: true,
            phase: PollPhase::Mounting,
            fetches: 0,
            last_error: None,
        }
    }
}

pub struct SlotPoller;

impl SlotPoller {
    /// Mounts a poller: fetches immediately, then once per `every`, and
    /// again whenever the registry asks for a refresh.
    pub fn mount(
        source: Arc<dyn SlotSource>,
        registry: RefreshRegistry,
        every: Duration,
    ) -> PollerHandle {
        let every = timer_period(every);
        let (id, refresh) = registry.subscribe();
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(PollState::default());

        tracing::info!("Poller {} mounted ({:?} interval)", id, every);
        let task = tokio::spawn(run(source, every, refresh, cancel.clone(), tx));

        PollerHandle {
            id,
            registry,
            cancel,
            state: rx,
            task: Some(task),
        }
    }
}

async fn run(
    source: Arc<dyn SlotSource>,
    every: Duration,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    state: watch::Sender<PollState>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately and serves as the mount fetch.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = refresh.notified() => tracing::debug!("Refresh requested"),
            _ = ticker.tick() => {}
        }
        fetch_once(source.as_ref(), &cancel, &state).await;
    }

    state.send_modify(|s| {
        s.loading = false;
        s.phase = PollPhase::Unmounted;
    });
}

async fn fetch_once(
    source: &dyn SlotSource,
    cancel: &CancellationToken,
    state: &watch::Sender<PollState>,
) {
    state.send_modify(|s| {
        s.loading = true;
        s.phase = PollPhase::Fetching;
    });

    let result = source.fetch_slots().await;

    // The fetch is not interrupted by unmount, but its result must not land
    // on a view that is already gone.
    if cancel.is_cancelled() {
        tracing::debug!("Poller unmounted during fetch, result dropped");
        state.send_modify(|s| {
            s.loading = false;
            s.phase = PollPhase::Unmounting;
        });
        return;
    }

    state.send_modify(|s| {
        s.fetches += 1;
        match result {
            Ok(slots) => {
                s.slots = slots;
                s.last_error = None;
            }
            Err(e) => {
                tracing::error!("Slot fetch error: {}", e);
                s.slots.clear();
                s.last_error = Some(e.to_string());
            }
        }
        s.loading = false;
        s.phase = PollPhase::Idle;
    });
}

/// Owned by whatever mounted the poller. Dropping it unmounts the poller
/// without waiting for the task to wind down.
pub struct PollerHandle {
    id: SubscriberId,
    registry: RefreshRegistry,
    cancel: CancellationToken,
    state: watch::Receiver<PollState>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    fn detach(&self) {
        self.registry.unsubscribe(self.id);
        self.cancel.cancel();
    }

    /// Stops the timer, leaves the registry and waits for the task to exit.
    pub async fn unmount(mut self) {
        self.detach();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Poller {} task failed: {}", self.id, e);
            }
        }
        tracing::info!("Poller {} unmounted", self.id);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, AppResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
    }

    impl CountingSource {
        fn slow(delay: Duration) -> Self {
            Self { delay, ..Self::default() }
        }

        fn count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SlotSource for CountingSource {
        async fn fetch_slots(&self) -> AppResult<Vec<Slot>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Storage("sensor backend offline".into()));
            }
            Ok(vec![Slot::new("A1", "A1")])
        }
    }

    const EVERY: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn fetches_on_mount_then_once_per_interval() {
        let source = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry.clone(), EVERY);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.count(), 1);

        sleep(EVERY).await;
        assert_eq!(source.count(), 2);

        sleep(EVERY * 2).await;
        assert_eq!(source.count(), 4);

        handle.unmount().await;
        sleep(EVERY * 6).await;
        assert_eq!(source.count(), 4);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_triggers_exactly_one_extra_fetch() {
        let source = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry.clone(), EVERY);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(source.count(), 1);

        assert_eq!(registry.refresh_now(), 1);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.count(), 2);

        // The periodic schedule is unaffected by the forced fetch.
        sleep(Duration::from_secs(4)).await;
        assert_eq!(source.count(), 3);

        handle.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_during_a_fetch_coalesce_into_one() {
        let source = Arc::new(CountingSource::slow(Duration::from_millis(200)));
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry.clone(), EVERY);

        sleep(Duration::from_millis(50)).await;
        assert!(handle.state().loading);
        for _ in 0..3 {
            assert_eq!(registry.refresh_now(), 1);
        }

        // Mount fetch ends at 200ms, the single follow-up at 400ms.
        sleep(Duration::from_secs(1)).await;
        assert_eq!(source.count(), 2);
        let state = handle.state();
        assert_eq!(state.fetches, 2);
        assert_eq!(state.phase, PollPhase::Idle);

        handle.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_still_mounts_and_fetches() {
        let source = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry.clone(), Duration::ZERO);

        sleep(Duration::from_millis(5)).await;
        let state = handle.state();
        assert_eq!(state.fetches, 1);
        assert!(!state.loading);
        assert_eq!(state.phase, PollPhase::Idle);

        // The period is raised to the minimum rather than spinning.
        sleep(crate::config::MIN_INTERVAL).await;
        assert_eq!(source.count(), 2);

        handle.unmount().await;
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_without_pollers_fetches_nothing() {
        let source = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry.clone(), EVERY);
        sleep(Duration::from_millis(10)).await;
        handle.unmount().await;

        assert_eq!(registry.refresh_now(), 0);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(source.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_mounted_poller_is_refreshed() {
        let first = Arc::new(CountingSource::default());
        let second = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let a = SlotPoller::mount(first.clone(), registry.clone(), EVERY);
        let b = SlotPoller::mount(second.clone(), registry.clone(), EVERY);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(registry.refresh_now(), 2);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(first.count(), 2);
        assert_eq!(second.count(), 2);

        // Unmounting the first leaves the second refreshable.
        a.unmount().await;
        assert_eq!(registry.refresh_now(), 1);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(first.count(), 2);
        assert_eq!(second.count(), 3);

        drop(b);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loading_is_set_for_the_duration_of_a_fetch() {
        let source = Arc::new(CountingSource::slow(Duration::from_millis(200)));
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry, EVERY);

        sleep(Duration::from_millis(100)).await;
        let state = handle.state();
        assert!(state.loading);
        assert_eq!(state.phase, PollPhase::Fetching);

        sleep(Duration::from_millis(200)).await;
        let state = handle.state();
        assert!(!state.loading);
        assert_eq!(state.phase, PollPhase::Idle);
        assert_eq!(state.slots.len(), 1);
        assert_eq!(state.fetches, 1);

        handle.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_become_an_empty_list() {
        let source = Arc::new(CountingSource::default());
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry, EVERY);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.state().slots.len(), 1);

        source.fail.store(true, Ordering::SeqCst);
        sleep(EVERY).await;
        let state = handle.state();
        assert!(state.slots.is_empty());
        assert!(!state.loading);
        assert!(state.last_error.is_some());

        handle.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn result_arriving_after_unmount_is_dropped() {
        let source = Arc::new(CountingSource::slow(Duration::from_millis(500)));
        let registry = RefreshRegistry::new();
        let handle = SlotPoller::mount(source.clone(), registry, EVERY);
        let mut watcher = handle.watch();

        sleep(Duration::from_millis(100)).await;
        handle.unmount().await;

        let state = watcher.borrow_and_update().clone();
        assert_eq!(source.count(), 1);
        assert_eq!(state.fetches, 0);
        assert!(state.slots.is_empty());
        assert!(!state.loading);
        assert_eq!(state.phase, PollPhase::Unmounted);
    }
}
