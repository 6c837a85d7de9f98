use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use crate::errors::AppResult;
use super::kv_store::KeyValueStore;

/// Durable key-value store backed by Redis. Keys are namespaced under
/// `spinet:` so the instance can be shared.
#[derive(Clone)]
pub struct RedisStore {
    client: Arc<Client>,
}

impl RedisStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn namespaced(key: &str) -> String {
        format!("spinet:{}", key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.client.get_async_connection().await?;
        let value: Option<String> = conn.get(Self::namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        conn.set::<_, _, ()>(Self::namespaced(key), value).await?;
        Ok(())
    }
}
