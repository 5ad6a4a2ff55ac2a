//! 基于 Redis pub/sub 的实时事件频道
//!
//! 网关侧订阅对应频道把事件转发到 WebSocket；这里只负责 PUBLISH，
//! 没有订阅方时消息自然丢弃（实时事件本就是尽力而为）。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::repository::{ChannelKey, RealtimeChannel};

#[derive(Clone)]
pub struct RedisRealtimeChannel {
    namespace: String,
    connection: Arc<Mutex<ConnectionManager>>,
}

impl RedisRealtimeChannel {
    pub fn new(connection: Arc<Mutex<ConnectionManager>>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            connection,
        }
    }

    fn channel_name(&self, channel: &ChannelKey) -> String {
        format!("{}:channel:{}", self.namespace, channel.render())
    }
}

#[async_trait]
impl RealtimeChannel for RedisRealtimeChannel {
    async fn emit(&self, channel: &ChannelKey, event: &str, payload: Value) -> Result<()> {
        let envelope = json!({
            "event": event,
            "payload": payload,
        });
        let name = self.channel_name(channel);
        let mut conn = self.connection.lock().await;
        let receivers: i64 = conn
            .publish(&name, envelope.to_string())
            .await
            .context("publish realtime event")?;
        debug!(channel = %name, event = event, receivers, "realtime event published");
        Ok(())
    }
}
