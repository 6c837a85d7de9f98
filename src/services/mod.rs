mod device_hub;
pub mod kv_store;
pub mod persistence;
mod redis_service;
mod sensor_board;
mod slot_store;
mod user_service;

pub use device_hub::DeviceHub;
pub use kv_store::{KeyValueStore, MemoryStore};
pub use persistence::{PersistedValue, SLOT_DATA_KEY, USERS_KEY};
pub use redis_service::RedisStore;
pub use sensor_board::{SensorBoard, SensorReport};
pub use slot_store::{SlotAck, SlotSource, SlotStore};
pub use user_service::UserService;
