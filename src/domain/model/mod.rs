//! QoS 领域模型
//!
//! 通话质量监控的核心值对象与实体：指标采样、会话质量报告、质量告警。

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Stable,
    Unstable,
    Reconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Stable => "stable",
            ConnectionState::Unstable => "unstable",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Disconnected => "disconnected",
        }
    }

    /// 视为连接异常（触发 connection instability 问题项）
    pub fn is_unstable(&self) -> bool {
        matches!(self, ConnectionState::Unstable | ConnectionState::Reconnecting)
    }
}

impl FromStr for ConnectionState {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stable" => Ok(ConnectionState::Stable),
            "unstable" => Ok(ConnectionState::Unstable),
            "reconnecting" => Ok(ConnectionState::Reconnecting),
            "disconnected" => Ok(ConnectionState::Disconnected),
            _ => Err(()),
        }
    }
}

/// 上下行带宽（Mbps）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bandwidth {
    pub upload_mbps: f64,
    pub download_mbps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetrics {
    pub resolution: String,
    pub frame_rate: f64,
    pub bitrate: f64,
    pub codec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetrics {
    pub bitrate: f64,
    pub codec: String,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub state: ConnectionState,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub candidate_type: String,
}

/// 一个采样周期内上报的网络/媒体指标。
///
/// 子指标缺失表示客户端无法测量该项，评分时按最差情况（该分量记 0 分）处理，
/// 避免悄悄高估质量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosMetrics {
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub jitter_ms: Option<f64>,
    #[serde(default)]
    pub packet_loss_percent: Option<f64>,
    #[serde(default)]
    pub bandwidth: Option<Bandwidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioMetrics>,
    pub connection: ConnectionInfo,
}

/// 单条时间戳化的指标采样，写入后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosSample {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: QosMetrics,
    pub user_id: String,
    pub user_role: String,
}

impl QosSample {
    /// 从上报者角色推断参与者标识（信令协作方不可用时的回退路径）
    pub fn participant_hint(&self) -> (Option<String>, Option<String>) {
        match self.user_role.as_str() {
            "doctor" => (Some(self.user_id.clone()), None),
            "patient" => (None, Some(self.user_id.clone())),
            _ => (None, None),
        }
    }
}

/// 告警严重级别（有序：Low < Medium < High < Critical）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(()),
        }
    }
}

/// 质量分析结果（纯函数输出）
#[derive(Debug, Clone)]
pub struct QualityAnalysis {
    pub issues: Vec<String>,
    pub severity: AlertSeverity,
    pub recommendations: Vec<String>,
}

impl QualityAnalysis {
    pub fn needs_alert(&self) -> bool {
        !self.issues.is_empty() && self.severity != AlertSeverity::Low
    }

    /// 问题项的自由文本摘要，用于告警记录
    pub fn issue_summary(&self) -> String {
        self.issues.join(", ")
    }
}

/// 一次已结束通话会话的质量报告。
///
/// 创建后不再变更，软删除（`active = false`）是唯一允许的后续操作。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosSessionReport {
    pub report_id: String,
    pub session_id: String,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub avg_latency: f64,
    pub avg_jitter: f64,
    pub avg_packet_loss: f64,
    pub avg_bandwidth: Bandwidth,
    pub quality_score: u8,
    pub issues: Vec<String>,
    pub active: bool,
}

/// 质量告警记录。
///
/// 持久化后除 `resolved` 标志外不可变；通知投递失败不会回滚该记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosAlert {
    pub alert_id: String,
    pub session_id: String,
    pub issue: String,
    pub severity: AlertSeverity,
    pub metrics: QosMetrics,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

/// 报告查询过滤器（等值 + 时间范围）
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub session_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// 报告排序（字段白名单由持久层裁决）
#[derive(Debug, Clone)]
pub struct ReportSort {
    pub field: String,
    pub ascending: bool,
}

impl Default for ReportSort {
    fn default() -> Self {
        Self {
            field: "start_time".to_string(),
            ascending: false,
        }
    }
}

/// 分页窗口
#[derive(Debug, Clone, Copy)]
pub struct ReportPage {
    pub limit: i64,
    pub offset: i64,
}

impl Default for ReportPage {
    fn default() -> Self {
        Self { limit: 20, offset: 0 }
    }
}

/// 质量分布桶：excellent ≥90、good [70,90)、fair [50,70)、poor <50
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDistribution {
    pub excellent: u64,
    pub good: u64,
    pub fair: u64,
    pub poor: u64,
}

impl QualityDistribution {
    pub fn bucket(&mut self, quality_score: u8) {
        match quality_score {
            90..=u8::MAX => self.excellent += 1,
            70..=89 => self.good += 1,
            50..=69 => self.fair += 1,
            _ => self.poor += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.excellent + self.good + self.fair + self.poor
    }
}

/// 面向仪表盘的全局聚合指标
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedQos {
    pub total_sessions: u64,
    pub avg_quality_score: f64,
    pub avg_latency: f64,
    pub avg_jitter: f64,
    pub avg_packet_loss: f64,
    pub total_duration: i64,
    pub quality_distribution: QualityDistribution,
    pub common_issues: Vec<String>,
}

/// 单会话的原始采样统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQosSummary {
    pub avg_latency: f64,
    pub avg_jitter: f64,
    pub avg_packet_loss: f64,
    pub min_latency: f64,
    pub max_latency: f64,
    pub avg_bandwidth: Bandwidth,
    pub connection_stability: f64,
    pub total_metrics_count: u64,
}

/// 时间线图表点（降采样后 ≤ ~100 个）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub timestamp: DateTime<Utc>,
    pub latency: Option<f64>,
    pub jitter: Option<f64>,
    pub packet_loss: Option<f64>,
    pub bandwidth: Option<Bandwidth>,
}

/// 信令协作方持有的会话摘要（仅用于参与者查找，不拥有会话生命周期）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSessionSummary {
    pub session_id: String,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}
