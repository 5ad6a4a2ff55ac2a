//! 实时指标的 Redis 缓存
//!
//! 每会话一个短 TTL 条目，last-write-wins；同时承载告警去重窗口的
//! SET NX 守卫。两者都是咨询性的，失效不影响历史存储的正确性。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

use crate::domain::model::QosMetrics;
use crate::domain::repository::RealtimeMetricsCache;

#[derive(Clone)]
pub struct RedisRealtimeCache {
    namespace: String,
    connection: Arc<Mutex<ConnectionManager>>,
}

impl RedisRealtimeCache {
    pub fn new(connection: Arc<Mutex<ConnectionManager>>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            connection,
        }
    }

    /// 类型化键构建，避免裸字符串拼接引发的键冲突
    fn realtime_key(&self, session_id: &str) -> String {
        format!("{}:realtime:{}", self.namespace, session_id)
    }

    fn alert_window_key(&self, session_id: &str, issue: &str) -> String {
        format!("{}:alert-window:{}:{}", self.namespace, session_id, issue)
    }
}

#[async_trait]
impl RealtimeMetricsCache for RedisRealtimeCache {
    async fn put_latest(
        &self,
        session_id: &str,
        metrics: &QosMetrics,
        ttl: Duration,
    ) -> Result<()> {
        let payload = serde_json::to_string(metrics).context("serialize realtime metrics")?;
        let mut conn = self.connection.lock().await;
        let _: () = conn
            .set_ex(self.realtime_key(session_id), payload, ttl.as_secs())
            .await
            .context("cache realtime metrics in redis")?;
        Ok(())
    }

    async fn get_latest(&self, session_id: &str) -> Result<Option<QosMetrics>> {
        let mut conn = self.connection.lock().await;
        let value: Option<String> = conn.get(self.realtime_key(session_id)).await?;
        match value {
            Some(value) => {
                let metrics =
                    serde_json::from_str(&value).context("deserialize realtime metrics")?;
                Ok(Some(metrics))
            }
            None => Ok(None),
        }
    }

    async fn acquire_alert_window(
        &self,
        session_id: &str,
        issue: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = self.connection.lock().await;
        // SET NX EX：窗口内第一个调用方拿到守卫，其余视为重复
        let acquired: Option<String> = redis::cmd("SET")
            .arg(self.alert_window_key(session_id, issue))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut *conn)
            .await
            .context("acquire alert dedup window")?;
        Ok(acquired.is_some())
    }

    async fn release_alert_window(&self, session_id: &str, issue: &str) -> Result<()> {
        let mut conn = self.connection.lock().await;
        let _: () = conn
            .del(self.alert_window_key(session_id, issue))
            .await
            .context("release alert dedup window")?;
        Ok(())
    }
}
