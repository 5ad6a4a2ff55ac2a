//! 质量评分与质量分析（纯函数，无 I/O 无副作用）

use crate::domain::model::{AlertSeverity, QosMetrics, QualityAnalysis};

/// 各分量权重
const LATENCY_WEIGHT: f64 = 0.3;
const JITTER_WEIGHT: f64 = 0.2;
const PACKET_LOSS_WEIGHT: f64 = 0.3;
const BANDWIDTH_WEIGHT: f64 = 0.2;

/// 告警阈值
const LATENCY_ALERT_MS: f64 = 200.0;
const JITTER_ALERT_MS: f64 = 50.0;
const PACKET_LOSS_ALERT_PERCENT: f64 = 5.0;

/// 建议阈值
const LATENCY_HINT_MS: f64 = 150.0;
const PACKET_LOSS_HINT_PERCENT: f64 = 2.0;
const UPLOAD_HINT_MBPS: f64 = 1.0;

/// 计算 0..=100 的综合质量得分。
///
/// 每个分量先钳制到 [0,100]：延迟 200ms 归零、抖动 50ms 归零、
/// 丢包 10% 归零、下行带宽 10Mbps 打满。缺失分量按 0 分计。
pub fn quality_score(metrics: &QosMetrics) -> u8 {
    let latency_score = metrics
        .latency_ms
        .map(|latency| (100.0 - latency / 2.0).max(0.0))
        .unwrap_or(0.0);
    let jitter_score = metrics
        .jitter_ms
        .map(|jitter| (100.0 - jitter * 2.0).max(0.0))
        .unwrap_or(0.0);
    let packet_loss_score = metrics
        .packet_loss_percent
        .map(|loss| (100.0 - loss * 10.0).max(0.0))
        .unwrap_or(0.0);
    let bandwidth_score = metrics
        .bandwidth
        .map(|bw| (bw.download_mbps * 10.0).min(100.0))
        .unwrap_or(0.0);

    let total = latency_score * LATENCY_WEIGHT
        + jitter_score * JITTER_WEIGHT
        + packet_loss_score * PACKET_LOSS_WEIGHT
        + bandwidth_score * BANDWIDTH_WEIGHT;

    total.round().clamp(0.0, 100.0) as u8
}

/// 分析单条采样，产出问题项、严重级别与改善建议。
///
/// 各规则独立求值，严重级别取触发规则中的最大值；
/// 建议文本仅供展示，不参与控制流。
pub fn analyze_quality(metrics: &QosMetrics) -> QualityAnalysis {
    let mut issues = Vec::new();
    let mut severity = AlertSeverity::Low;

    if metrics.latency_ms.is_some_and(|latency| latency > LATENCY_ALERT_MS) {
        issues.push("High latency detected".to_string());
        severity = severity.max(AlertSeverity::High);
    }
    if metrics.jitter_ms.is_some_and(|jitter| jitter > JITTER_ALERT_MS) {
        issues.push("High jitter affecting stability".to_string());
        severity = severity.max(AlertSeverity::Medium);
    }
    if metrics
        .packet_loss_percent
        .is_some_and(|loss| loss > PACKET_LOSS_ALERT_PERCENT)
    {
        issues.push("Significant packet loss".to_string());
        severity = severity.max(AlertSeverity::High);
    }
    if metrics.connection.state.is_unstable() {
        issues.push("Connection instability".to_string());
        severity = severity.max(AlertSeverity::Medium);
    }

    QualityAnalysis {
        issues,
        severity,
        recommendations: recommendations(metrics),
    }
}

fn recommendations(metrics: &QosMetrics) -> Vec<String> {
    let mut hints = Vec::new();

    if metrics.latency_ms.is_some_and(|latency| latency > LATENCY_HINT_MS) {
        hints.push("Consider switching to a wired connection".to_string());
    }
    if metrics
        .packet_loss_percent
        .is_some_and(|loss| loss > PACKET_LOSS_HINT_PERCENT)
    {
        hints.push("Check network congestion and close bandwidth-heavy applications".to_string());
    }
    if metrics
        .bandwidth
        .is_some_and(|bw| bw.upload_mbps < UPLOAD_HINT_MBPS)
    {
        hints.push("Minimum 1 Mbps upload speed recommended for video calls".to_string());
    }

    hints
}
