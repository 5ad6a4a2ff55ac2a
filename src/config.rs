use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

/// QoS 服务配置，全部来自环境变量（带默认值）
#[derive(Clone, Debug)]
pub struct QosConfig {
    /// HTTP 监听地址
    pub listen_addr: SocketAddr,
    /// 采样/报告/告警的持久存储
    pub postgres_url: String,
    /// 实时缓存与事件频道
    pub redis_url: String,
    /// 缓存键命名空间
    pub namespace: String,
    /// 实时缓存条目 TTL
    pub realtime_ttl: Duration,
    /// 聚合结果缓存 TTL
    pub aggregate_ttl: Duration,
    /// 告警去重窗口，0 关闭去重
    pub alert_dedup_window: Duration,
    /// 通知协作方基地址；未配置时通知环节退化为 no-op
    pub notification_base_url: Option<String>,
    /// 信令协作方基地址；未配置时跳过会话查找
    pub signaling_base_url: Option<String>,
    /// 对外部协作方调用的统一超时
    pub collaborator_timeout: Duration,
}

impl QosConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("QOS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8087".to_string())
            .parse::<SocketAddr>()
            .context("invalid QOS_LISTEN_ADDR")?;

        let postgres_url = env::var("QOS_POSTGRES_URL")
            .or_else(|_| env::var("STORAGE_POSTGRES_URL"))
            .context("QOS_POSTGRES_URL is required")?;

        let redis_url = env::var("QOS_REDIS_URL")
            .or_else(|_| env::var("STORAGE_REDIS_URL"))
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

        let namespace = env::var("QOS_CACHE_NAMESPACE").unwrap_or_else(|_| "qos".to_string());

        let realtime_ttl = duration_from_env("QOS_REALTIME_TTL_SECONDS", 60);
        let aggregate_ttl = duration_from_env("QOS_AGGREGATE_TTL_SECONDS", 300);
        let alert_dedup_window = duration_from_env("QOS_ALERT_DEDUP_SECONDS", 300);
        let collaborator_timeout = duration_from_env("QOS_COLLABORATOR_TIMEOUT_SECONDS", 5);

        let notification_base_url = env::var("QOS_NOTIFICATION_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty());
        let signaling_base_url = env::var("QOS_SIGNALING_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            listen_addr,
            postgres_url,
            redis_url,
            namespace,
            realtime_ttl,
            aggregate_ttl,
            alert_dedup_window,
            notification_base_url,
            signaling_base_url,
            collaborator_timeout,
        })
    }
}

fn duration_from_env(key: &str, default_seconds: u64) -> Duration {
    let seconds = env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_seconds);
    Duration::from_secs(seconds)
}
