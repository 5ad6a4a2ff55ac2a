//! 领域仓储端口
//!
//! 窄接口的 repository 风格端口：持久存储、实时缓存与外部协作方均在此抽象，
//! 便于在测试中替换为内存假实现。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use crate::domain::model::{
    AggregatedQos, AlertSeverity, CallSessionSummary, QosAlert, QosMetrics, QosSample,
    QosSessionReport, ReportFilter, ReportPage, ReportSort,
};

/// 采样历史存储：持久、追加写，写入的样本不再变更
#[async_trait::async_trait]
pub trait MetricsHistoryStore: Send + Sync {
    async fn append_sample(&self, sample: &QosSample) -> Result<()>;
    /// 最近的采样，最新在前
    async fn recent_samples(&self, session_id: &str, limit: i64) -> Result<Vec<QosSample>>;
    /// 全量采样，最旧在前（时间线用）
    async fn samples_asc(&self, session_id: &str) -> Result<Vec<QosSample>>;
}

/// 会话报告存储
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, report: &QosSessionReport) -> Result<()>;
    /// 过滤/排序/分页查询；total 独立于分页窗口计算
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        sort: &ReportSort,
        page: &ReportPage,
    ) -> Result<(Vec<QosSessionReport>, u64)>;
    /// 软删除
    async fn deactivate_report(&self, report_id: &str) -> Result<()>;
}

/// 告警存储：告警是事实记录，通知失败不回滚
#[async_trait::async_trait]
pub trait AlertStore: Send + Sync {
    async fn create_alert(&self, alert: &QosAlert) -> Result<()>;
    /// resolved 是告警唯一允许的变更
    async fn resolve_alert(&self, alert_id: &str) -> Result<bool>;
    async fn list_session_alerts(&self, session_id: &str) -> Result<Vec<QosAlert>>;
}

/// 实时指标缓存：短 TTL、last-write-wins、纯咨询性（失败不影响历史正确性）
#[async_trait::async_trait]
pub trait RealtimeMetricsCache: Send + Sync {
    async fn put_latest(&self, session_id: &str, metrics: &QosMetrics, ttl: Duration)
        -> Result<()>;
    async fn get_latest(&self, session_id: &str) -> Result<Option<QosMetrics>>;
    /// 告警去重窗口：同一 (session, issue) 在窗口内只允许一次，返回 false 表示重复。
    /// 尽力而为，调用方应把失败当作"不去重"处理。
    async fn acquire_alert_window(
        &self,
        session_id: &str,
        issue: &str,
        ttl: Duration,
    ) -> Result<bool>;
    /// 释放去重窗口；告警未能落库时回收窗口，避免压掉后续真实告警
    async fn release_alert_window(&self, session_id: &str, issue: &str) -> Result<()>;
}

/// 聚合结果缓存（5 分钟 TTL 的查询优化，未命中或失败时直接回退重算）
#[async_trait::async_trait]
pub trait AggregateCache: Send + Sync {
    async fn get(&self, scope: &str) -> Result<Option<AggregatedQos>>;
    async fn put(&self, scope: &str, aggregated: &AggregatedQos, ttl: Duration) -> Result<()>;
}

/// 实时推送频道键，类型化构建避免字符串拼接冲突
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKey {
    /// 某个用户的私有频道
    User(String),
    /// 全局运维监控频道
    Monitoring,
}

impl ChannelKey {
    pub fn render(&self) -> String {
        match self {
            ChannelKey::User(user_id) => format!("user:{}", user_id),
            ChannelKey::Monitoring => "admin:monitoring".to_string(),
        }
    }
}

/// 实时推送频道（WebSocket/pub-sub 协作方）
#[async_trait::async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn emit(&self, channel: &ChannelKey, event: &str, payload: Value) -> Result<()>;
}

/// 通知渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Push,
    Email,
    InApp,
}

/// 通知优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// 发往通知协作方的请求
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub user_id: String,
    pub kind: String,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub channels: Vec<NotificationChannel>,
}

/// 通知协作方（push/email/in-app 的实际投递在系统边界之外）
#[async_trait::async_trait]
pub trait NotificationSender: Send + Sync {
    async fn create_notification(&self, request: &NotificationRequest) -> Result<()>;
    async fn create_from_template(
        &self,
        template: &str,
        recipient: &str,
        data: Value,
    ) -> Result<()>;
}

/// 信令协作方的会话查找接口（只读）
#[async_trait::async_trait]
pub trait SessionDirectory: Send + Sync {
    async fn get_session(&self, session_id: &str) -> Result<Option<CallSessionSummary>>;
}

pub type MetricsHistoryStoreRef = Arc<dyn MetricsHistoryStore>;
pub type ReportStoreRef = Arc<dyn ReportStore>;
pub type AlertStoreRef = Arc<dyn AlertStore>;
pub type RealtimeMetricsCacheRef = Arc<dyn RealtimeMetricsCache>;
pub type AggregateCacheRef = Arc<dyn AggregateCache>;
pub type RealtimeChannelRef = Arc<dyn RealtimeChannel>;
pub type NotificationSenderRef = Arc<dyn NotificationSender>;
pub type SessionDirectoryRef = Arc<dyn SessionDirectory>;

/// 聚合缓存作用域键（doctor 维度或全局哨兵）
pub fn aggregate_scope(doctor_id: Option<&str>) -> String {
    doctor_id.unwrap_or("all").to_string()
}

/// `AlertSeverity` 到通知优先级的映射
pub fn severity_priority(severity: AlertSeverity) -> NotificationPriority {
    match severity {
        AlertSeverity::Critical => NotificationPriority::Urgent,
        AlertSeverity::High => NotificationPriority::High,
        AlertSeverity::Medium => NotificationPriority::Medium,
        AlertSeverity::Low => NotificationPriority::Low,
    }
}
