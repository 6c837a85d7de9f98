use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use spinet::{
    config::Config,
    feeds::{HttpPollFeed, PubSubSimulator, SlotFeed},
    fixtures::{generate_lot, static_lot},
    handlers,
    models::{HealthWindows, Slot, SlotStatus},
    poller::{PollerHandle, RefreshRegistry, SlotPoller},
    services::{
        DeviceHub, KeyValueStore, MemoryStore, PersistedValue, RedisStore, SensorBoard,
        SlotStore, UserService, SLOT_DATA_KEY, USERS_KEY,
    },
    state::AppState,
    worker::{self, FeedContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Key-value backend for the persisted slot snapshot and user list
    let kv: Arc<dyn KeyValueStore> = if config.redis.enabled {
        let client = redis::Client::open(config.redis.url.as_str())
            .context("Failed to connect to Redis")?;
        tracing::info!("Persisting to Redis at {}", config.redis.url);
        Arc::new(RedisStore::new(Arc::new(client)))
    } else {
        tracing::info!("Persisting in memory only");
        Arc::new(MemoryStore::new())
    };

    // Seed the lot, then prefer whatever snapshot was persisted last time
    let now = Utc::now();
    let lot = match config.store.seed {
        Some(seed) => generate_lot(seed, now),
        None => static_lot(now),
    };
    let snapshot: PersistedValue<Vec<Slot>> = PersistedValue::new(kv.clone(), SLOT_DATA_KEY);
    let slots = snapshot.load(lot.slots).await;

    let store = SlotStore::new(slots, config.store.latency());
    let windows = HealthWindows {
        ok: chrono::Duration::seconds(config.sensors.ok_window_secs),
        stale: chrono::Duration::seconds(config.sensors.stale_window_secs),
    };
    let sensors = SensorBoard::new(lot.sensors, windows, config.sensors.history_len);
    let registry = RefreshRegistry::new();
    let users = UserService::new(PersistedValue::new(kv.clone(), USERS_KEY), config.user.bcrypt_cost);

    // Start the live feeds
    let shutdown = CancellationToken::new();
    let feed_ctx = FeedContext {
        store: store.clone(),
        sensors: sensors.clone(),
        registry: registry.clone(),
        snapshot: Some(snapshot.clone()),
    };
    let mut feeds: Vec<Box<dyn SlotFeed>> = Vec::new();
    if config.feeds.pubsub_enabled {
        let pool: Vec<String> = store
            .snapshot()
            .await
            .into_iter()
            .take(config.feeds.pubsub_pool_size)
            .map(|s| s.id)
            .collect();
        feeds.push(Box::new(PubSubSimulator::new(pool, config.feeds.pubsub_interval())));
    }
    if config.feeds.http_enabled {
        feeds.push(Box::new(HttpPollFeed::new(
            config.feeds.http_url.clone(),
            config.feeds.http_interval(),
        )));
    }
    let workers: Vec<_> = feeds
        .into_iter()
        .map(|feed| tokio::spawn(worker::feed_process(feed, feed_ctx.clone(), shutdown.clone())))
        .collect();

    // A headless view over the lot, logging occupancy whenever it changes
    let overview = SlotPoller::mount(
        Arc::new(store.clone()),
        registry.clone(),
        config.polling.interval(),
    );
    tokio::spawn(log_occupancy(&overview));

    let app = handlers::router(
        AppState {
            slots: store,
            sensors,
            users,
            devices: DeviceHub::new(),
            registry,
            snapshot,
        },
        config.server.max_body_size,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Failed to start server")?;

    tracing::info!("Shutting down");
    shutdown.cancel();
    for handle in workers {
        if let Err(e) = handle.await {
            tracing::error!("Feed worker failed: {}", e);
        }
    }
    overview.unmount().await;
    Ok(())
}

fn log_occupancy(poller: &PollerHandle) -> impl std::future::Future<Output = ()> {
    let mut state = poller.watch();
    async move {
        while state.changed().await.is_ok() {
            let view = state.borrow_and_update().clone();
            if view.loading {
                continue;
            }
            let count = |status: SlotStatus| view.slots.iter().filter(|s| s.status == status).count();
            tracing::info!(
                "Lot: {} free, {} occupied, {} reserved",
                count(SlotStatus::Free),
                count(SlotStatus::Occupied),
                count(SlotStatus::Reserved)
            );
        }
    }
}
