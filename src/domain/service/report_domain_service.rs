//! 报告聚合领域服务
//!
//! 所有聚合输出都只从历史存储推导（重算幂等）；聚合缓存与实时缓存
//! 纯属优化，未命中或失败一律回退为直接计算，绝不升级为错误。

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::model::{
    AggregatedQos, Bandwidth, ConnectionState, QosMetrics, QosSample, QosSessionReport,
    QualityDistribution, ReportFilter, ReportPage, ReportSort, SessionQosSummary, TimelinePoint,
};
use crate::domain::repository::{
    AggregateCacheRef, MetricsHistoryStoreRef, RealtimeMetricsCacheRef, ReportStoreRef,
    SessionDirectoryRef, aggregate_scope,
};

/// 单会话统计最多回看的采样条数
const SESSION_METRICS_SAMPLE_LIMIT: i64 = 1000;
/// 时间线降采样的目标点数
const TIMELINE_TARGET_POINTS: usize = 100;
/// 常见问题排行的截断长度
const COMMON_ISSUE_LIMIT: usize = 5;

pub struct ReportDomainService {
    history: MetricsHistoryStoreRef,
    reports: ReportStoreRef,
    realtime_cache: RealtimeMetricsCacheRef,
    aggregate_cache: AggregateCacheRef,
    sessions: Option<SessionDirectoryRef>,
    aggregate_ttl: Duration,
}

impl ReportDomainService {
    pub fn new(
        history: MetricsHistoryStoreRef,
        reports: ReportStoreRef,
        realtime_cache: RealtimeMetricsCacheRef,
        aggregate_cache: AggregateCacheRef,
        sessions: Option<SessionDirectoryRef>,
        aggregate_ttl: Duration,
    ) -> Self {
        Self {
            history,
            reports,
            realtime_cache,
            aggregate_cache,
            sessions,
            aggregate_ttl,
        }
    }

    /// 过滤/排序/分页的报告查询；total 独立于分页窗口
    pub async fn list_reports(
        &self,
        filter: &ReportFilter,
        sort: &ReportSort,
        page: &ReportPage,
    ) -> Result<(Vec<QosSessionReport>, u64)> {
        self.reports.list_reports(filter, sort, page).await
    }

    /// 仪表盘聚合指标，带 5 分钟 TTL 的尽力缓存。
    ///
    /// 起止时间各自独立生效，允许只给一侧的开放区间。
    pub async fn aggregated_metrics(
        &self,
        doctor_id: Option<&str>,
        start_date: Option<chrono::DateTime<Utc>>,
        end_date: Option<chrono::DateTime<Utc>>,
    ) -> Result<AggregatedQos> {
        let scope = aggregate_scope(doctor_id);

        match self.aggregate_cache.get(&scope).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(scope = %scope, error = %e, "aggregate cache read failed"),
        }

        let filter = ReportFilter {
            doctor_id: doctor_id.map(str::to_string),
            start_time: start_date,
            end_time: end_date,
            ..ReportFilter::default()
        };
        let (reports, _) = self
            .reports
            .list_reports(
                &filter,
                &ReportSort::default(),
                &ReportPage {
                    limit: i64::MAX,
                    offset: 0,
                },
            )
            .await
            .context("load reports for aggregation")?;

        let aggregated = aggregate_reports(&reports);

        if let Err(e) = self
            .aggregate_cache
            .put(&scope, &aggregated, self.aggregate_ttl)
            .await
        {
            warn!(scope = %scope, error = %e, "aggregate cache write failed");
        }

        Ok(aggregated)
    }

    /// 单会话统计：最近 1000 条采样；无采样时返回 None
    pub async fn session_metrics(&self, session_id: &str) -> Result<Option<SessionQosSummary>> {
        let samples = self
            .history
            .recent_samples(session_id, SESSION_METRICS_SAMPLE_LIMIT)
            .await
            .context("load session samples")?;
        Ok(summarize_samples(&samples))
    }

    /// 降采样后的会话时间线（最旧在前，≤ ~100 点）
    pub async fn session_timeline(&self, session_id: &str) -> Result<Vec<TimelinePoint>> {
        let samples = self
            .history
            .samples_asc(session_id)
            .await
            .context("load session timeline samples")?;
        Ok(downsample_timeline(&samples))
    }

    /// 软删除一份报告，报告定稿后唯一允许的变更
    pub async fn deactivate_report(&self, report_id: &str) -> Result<()> {
        self.reports
            .deactivate_report(report_id)
            .await
            .context("deactivate session report")?;
        info!(report_id = %report_id, "session report deactivated");
        Ok(())
    }

    /// 实时缓存里的最新指标；缓存失败按未命中处理
    pub async fn realtime_metrics(&self, session_id: &str) -> Option<QosMetrics> {
        match self.realtime_cache.get_latest(session_id).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "realtime cache read failed");
                None
            }
        }
    }

    /// 会话结束时的报告定稿：平均全部采样、为均值评分、合并问题项并持久化。
    ///
    /// 无采样时返回 None；参与者缺省时通过信令协作方补全。
    pub async fn finalize_session(
        &self,
        session_id: &str,
        doctor_id: Option<String>,
        patient_id: Option<String>,
    ) -> Result<Option<QosSessionReport>> {
        let samples = self
            .history
            .samples_asc(session_id)
            .await
            .context("load samples for session finalization")?;
        let Some(summary) = summarize_samples(&samples) else {
            return Ok(None);
        };
        let Some(last_connection) = samples.last().map(|s| s.metrics.connection.clone()) else {
            return Ok(None);
        };

        let (mut doctor_id, mut patient_id) = (doctor_id, patient_id);
        let mut start_time = samples.first().map(|s| s.timestamp).unwrap_or_else(Utc::now);
        let mut end_time = samples.last().map(|s| s.timestamp).unwrap_or_else(Utc::now);

        if doctor_id.is_none() || patient_id.is_none() {
            if let Some(directory) = &self.sessions {
                match directory.get_session(session_id).await {
                    Ok(Some(call)) => {
                        doctor_id = doctor_id.or(call.doctor_id);
                        patient_id = patient_id.or(call.patient_id);
                        start_time = call.started_at.unwrap_or(start_time);
                        end_time = call.ended_at.unwrap_or(end_time);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "session lookup failed")
                    }
                }
            }
        }

        let averaged = QosMetrics {
            latency_ms: Some(summary.avg_latency),
            jitter_ms: Some(summary.avg_jitter),
            packet_loss_percent: Some(summary.avg_packet_loss),
            bandwidth: Some(summary.avg_bandwidth),
            video: None,
            audio: None,
            connection: last_connection,
        };

        let mut issues: Vec<String> = Vec::new();
        for sample in &samples {
            for issue in super::quality::analyze_quality(&sample.metrics).issues {
                if !issues.contains(&issue) {
                    issues.push(issue);
                }
            }
        }

        let report = QosSessionReport {
            report_id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            doctor_id,
            patient_id,
            start_time,
            end_time,
            duration_seconds: (end_time - start_time).num_seconds().max(0),
            avg_latency: summary.avg_latency,
            avg_jitter: summary.avg_jitter,
            avg_packet_loss: summary.avg_packet_loss,
            avg_bandwidth: summary.avg_bandwidth,
            quality_score: super::quality::quality_score(&averaged),
            issues,
            active: true,
        };

        self.reports
            .create_report(&report)
            .await
            .context("persist session report")?;

        info!(
            session_id = %session_id,
            report_id = %report.report_id,
            quality_score = report.quality_score,
            "session report finalized"
        );

        Ok(Some(report))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u64;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// 报告集合的聚合，结果完全由输入决定
pub fn aggregate_reports(reports: &[QosSessionReport]) -> AggregatedQos {
    let mut distribution = QualityDistribution::default();
    for report in reports {
        distribution.bucket(report.quality_score);
    }

    AggregatedQos {
        total_sessions: reports.len() as u64,
        avg_quality_score: mean(reports.iter().map(|r| r.quality_score as f64)),
        avg_latency: mean(reports.iter().map(|r| r.avg_latency)),
        avg_jitter: mean(reports.iter().map(|r| r.avg_jitter)),
        avg_packet_loss: mean(reports.iter().map(|r| r.avg_packet_loss)),
        total_duration: reports.iter().map(|r| r.duration_seconds).sum(),
        quality_distribution: distribution,
        common_issues: common_issues(reports),
    }
}

/// 按出现次数排序的前 5 个问题项；同频次按字典序保证结果确定
fn common_issues(reports: &[QosSessionReport]) -> Vec<String> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for report in reports {
        for issue in &report.issues {
            *counts.entry(issue.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(COMMON_ISSUE_LIMIT)
        .map(|(issue, _)| issue.to_string())
        .collect()
}

/// 采样集合的统计摘要；空集返回 None
pub fn summarize_samples(samples: &[QosSample]) -> Option<SessionQosSummary> {
    if samples.is_empty() {
        return None;
    }

    let latencies: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.metrics.latency_ms)
        .collect();
    let stable = samples
        .iter()
        .filter(|s| s.metrics.connection.state == ConnectionState::Stable)
        .count();
    let min_latency = latencies.iter().copied().fold(f64::INFINITY, f64::min);

    Some(SessionQosSummary {
        avg_latency: mean(latencies.iter().copied()),
        avg_jitter: mean(samples.iter().filter_map(|s| s.metrics.jitter_ms)),
        avg_packet_loss: mean(samples.iter().filter_map(|s| s.metrics.packet_loss_percent)),
        min_latency: if min_latency.is_finite() { min_latency } else { 0.0 },
        max_latency: latencies.iter().copied().fold(0.0, f64::max),
        avg_bandwidth: Bandwidth {
            upload_mbps: mean(
                samples
                    .iter()
                    .filter_map(|s| s.metrics.bandwidth.map(|b| b.upload_mbps)),
            ),
            download_mbps: mean(
                samples
                    .iter()
                    .filter_map(|s| s.metrics.bandwidth.map(|b| b.download_mbps)),
            ),
        },
        connection_stability: stable as f64 / samples.len() as f64 * 100.0,
        total_metrics_count: samples.len() as u64,
    })
}

/// 等步长降采样：step = max(1, n/100)，保证输出不超过 ~100 点
pub fn downsample_timeline(samples: &[QosSample]) -> Vec<TimelinePoint> {
    let step = (samples.len() / TIMELINE_TARGET_POINTS).max(1);
    samples
        .iter()
        .step_by(step)
        .map(|sample| TimelinePoint {
            timestamp: sample.timestamp,
            latency: sample.metrics.latency_ms,
            jitter: sample.metrics.jitter_ms,
            packet_loss: sample.metrics.packet_loss_percent,
            bandwidth: sample.metrics.bandwidth,
        })
        .collect()
}
