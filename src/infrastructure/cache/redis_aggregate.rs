//! 聚合结果的 Redis 缓存（5 分钟 TTL 的查询优化）

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

use crate::domain::model::AggregatedQos;
use crate::domain::repository::AggregateCache;

#[derive(Clone)]
pub struct RedisAggregateCache {
    namespace: String,
    connection: Arc<Mutex<ConnectionManager>>,
}

impl RedisAggregateCache {
    pub fn new(connection: Arc<Mutex<ConnectionManager>>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            connection,
        }
    }

    fn key(&self, scope: &str) -> String {
        format!("{}:aggregated:{}", self.namespace, scope)
    }
}

#[async_trait]
impl AggregateCache for RedisAggregateCache {
    async fn get(&self, scope: &str) -> Result<Option<AggregatedQos>> {
        let mut conn = self.connection.lock().await;
        let value: Option<String> = conn.get(self.key(scope)).await?;
        match value {
            Some(value) => {
                let aggregated =
                    serde_json::from_str(&value).context("deserialize cached aggregate")?;
                Ok(Some(aggregated))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, scope: &str, aggregated: &AggregatedQos, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(aggregated).context("serialize aggregate")?;
        let mut conn = self.connection.lock().await;
        let _: () = conn
            .set_ex(self.key(scope), payload, ttl.as_secs())
            .await
            .context("cache aggregate in redis")?;
        Ok(())
    }
}
