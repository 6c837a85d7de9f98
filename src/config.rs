use config::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Shortest period any timer in the service will run at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Raises a timer period to `MIN_INTERVAL`. `tokio::time::interval` panics
/// on a zero period.
pub fn timer_period(every: Duration) -> Duration {
    if every < MIN_INTERVAL {
        tracing::warn!("Interval {:?} below minimum, using {:?}", every, MIN_INTERVAL);
        return MIN_INTERVAL;
    }
    every
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub store: StoreConfig,
    pub polling: PollingConfig,
    pub feeds: FeedsConfig,
    pub sensors: SensorsConfig,
    pub user: UserConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,  // in bytes
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub enabled: bool,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub latency_ms: u64,
    pub seed: Option<u64>,  // None = static fixture lot
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedsConfig {
    pub pubsub_enabled: bool,
    pub pubsub_interval_ms: u64,
    pub pubsub_pool_size: usize,
    pub http_enabled: bool,
    pub http_interval_ms: u64,
    pub http_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorsConfig {
    pub ok_window_secs: i64,
    pub stale_window_secs: i64,
    pub history_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize::<Self>()?.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        let intervals = [
            ("polling.interval_ms", self.polling.interval_ms),
            ("feeds.pubsub_interval_ms", self.feeds.pubsub_interval_ms),
            ("feeds.http_interval_ms", self.feeds.http_interval_ms),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Message(format!("{} must be greater than 0", key)));
            }
        }
        Ok(self)
    }
}

impl StoreConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl FeedsConfig {
    pub fn pubsub_interval(&self) -> Duration {
        Duration::from_millis(self.pubsub_interval_ms)
    }

    pub fn http_interval(&self) -> Duration {
        Duration::from_millis(self.http_interval_ms)
    }
}
