use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};

use crate::store::{RecordStore, StoreError};

/// Record store backed by a shared multiplexed Redis connection. The
/// connection is established once at startup and cloned per operation.
pub struct RedisRecordStore {
    conn: MultiplexedConnection,
}

impl RedisRecordStore {
    pub async fn connect(client: &redis::Client) -> redis::RedisResult<Self> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| StoreError::Read(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set(key, value)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}
