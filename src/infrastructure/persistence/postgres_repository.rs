//! # PostgreSQL QoS Store
//!
//! 采样历史、会话报告与告警的持久化实现。
//! 采样表只追加；报告只在定稿时写入一次；告警除 resolved 外不可变。

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::domain::model::{
    AlertSeverity, Bandwidth, QosAlert, QosMetrics, QosSample, QosSessionReport, ReportFilter,
    ReportPage, ReportSort,
};
use crate::domain::repository::{AlertStore, MetricsHistoryStore, ReportStore};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct PostgresQosStore {
    pool: Arc<PgPool>,
}

impl PostgresQosStore {
    pub async fn connect(postgres_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(postgres_url)
            .await
            .context("failed to connect to postgres")?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn with_pool(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 初始化表结构（幂等）
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qos_samples (
                id BIGSERIAL PRIMARY KEY,
                session_id TEXT NOT NULL,
                ts TIMESTAMPTZ NOT NULL,
                metrics JSONB NOT NULL,
                user_id TEXT NOT NULL,
                user_role TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(self.pool())
        .await
        .context("create qos_samples table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_qos_samples_session_ts
                ON qos_samples (session_id, ts DESC)
            "#,
        )
        .execute(self.pool())
        .await
        .context("create qos_samples index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qos_reports (
                report_id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                doctor_id TEXT,
                patient_id TEXT,
                start_time TIMESTAMPTZ NOT NULL,
                end_time TIMESTAMPTZ NOT NULL,
                duration_seconds BIGINT NOT NULL,
                avg_latency DOUBLE PRECISION NOT NULL,
                avg_jitter DOUBLE PRECISION NOT NULL,
                avg_packet_loss DOUBLE PRECISION NOT NULL,
                avg_upload_mbps DOUBLE PRECISION NOT NULL,
                avg_download_mbps DOUBLE PRECISION NOT NULL,
                quality_score SMALLINT NOT NULL,
                issues JSONB NOT NULL DEFAULT '[]'::jsonb,
                active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(self.pool())
        .await
        .context("create qos_reports table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_qos_reports_doctor_start
                ON qos_reports (doctor_id, start_time DESC)
            "#,
        )
        .execute(self.pool())
        .await
        .context("create qos_reports index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qos_alerts (
                alert_id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                issue TEXT NOT NULL,
                severity TEXT NOT NULL,
                metrics JSONB NOT NULL,
                doctor_id TEXT,
                patient_id TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                resolved BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(self.pool())
        .await
        .context("create qos_alerts table")?;

        info!("QoS postgres schema initialized");
        Ok(())
    }
}

fn sample_from_row(row: &sqlx::postgres::PgRow) -> Result<QosSample> {
    let metrics: serde_json::Value = row.get("metrics");
    Ok(QosSample {
        session_id: row.get("session_id"),
        timestamp: row.get("ts"),
        metrics: serde_json::from_value(metrics).context("deserialize sample metrics")?,
        user_id: row.get("user_id"),
        user_role: row.get("user_role"),
    })
}

fn report_from_row(row: &sqlx::postgres::PgRow) -> Result<QosSessionReport> {
    let issues: serde_json::Value = row.get("issues");
    let quality_score: i16 = row.get("quality_score");
    Ok(QosSessionReport {
        report_id: row.get("report_id"),
        session_id: row.get("session_id"),
        doctor_id: row.get("doctor_id"),
        patient_id: row.get("patient_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        duration_seconds: row.get("duration_seconds"),
        avg_latency: row.get("avg_latency"),
        avg_jitter: row.get("avg_jitter"),
        avg_packet_loss: row.get("avg_packet_loss"),
        avg_bandwidth: Bandwidth {
            upload_mbps: row.get("avg_upload_mbps"),
            download_mbps: row.get("avg_download_mbps"),
        },
        quality_score: quality_score.clamp(0, 100) as u8,
        issues: serde_json::from_value(issues).context("deserialize report issues")?,
        active: row.get("active"),
    })
}

fn alert_from_row(row: &sqlx::postgres::PgRow) -> Result<QosAlert> {
    let severity: String = row.get("severity");
    let metrics: serde_json::Value = row.get("metrics");
    Ok(QosAlert {
        alert_id: row.get("alert_id"),
        session_id: row.get("session_id"),
        issue: row.get("issue"),
        severity: AlertSeverity::from_str(&severity)
            .map_err(|_| anyhow!("invalid alert severity: {}", severity))?,
        metrics: serde_json::from_value(metrics).context("deserialize alert metrics")?,
        doctor_id: row.get("doctor_id"),
        patient_id: row.get("patient_id"),
        created_at: row.get("created_at"),
        resolved: row.get("resolved"),
    })
}

/// 报告排序字段白名单；未知字段回退到 start_time
fn sort_column(field: &str) -> &'static str {
    match field {
        "start_time" | "startTime" => "start_time",
        "end_time" | "endTime" => "end_time",
        "quality_score" | "qualityScore" => "quality_score",
        "duration_seconds" | "duration" => "duration_seconds",
        "avg_latency" | "avgLatency" => "avg_latency",
        "avg_packet_loss" | "avgPacketLoss" => "avg_packet_loss",
        _ => "start_time",
    }
}

/// 构建报告查询的 WHERE 子句；返回 (子句, 绑定计数)
fn report_conditions(filter: &ReportFilter) -> (String, usize) {
    let mut conditions = vec!["active = TRUE".to_string()];
    let mut bind_index = 0usize;

    if filter.doctor_id.is_some() {
        bind_index += 1;
        conditions.push(format!("doctor_id = ${}", bind_index));
    }
    if filter.patient_id.is_some() {
        bind_index += 1;
        conditions.push(format!("patient_id = ${}", bind_index));
    }
    if filter.session_id.is_some() {
        bind_index += 1;
        conditions.push(format!("session_id = ${}", bind_index));
    }
    if filter.start_time.is_some() {
        bind_index += 1;
        conditions.push(format!("start_time >= ${}", bind_index));
    }
    if filter.end_time.is_some() {
        bind_index += 1;
        conditions.push(format!("end_time <= ${}", bind_index));
    }

    (format!("WHERE {}", conditions.join(" AND ")), bind_index)
}

fn bind_report_filter<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    filter: &'q ReportFilter,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    if let Some(doctor_id) = &filter.doctor_id {
        query = query.bind(doctor_id);
    }
    if let Some(patient_id) = &filter.patient_id {
        query = query.bind(patient_id);
    }
    if let Some(session_id) = &filter.session_id {
        query = query.bind(session_id);
    }
    if let Some(start_time) = &filter.start_time {
        query = query.bind(start_time);
    }
    if let Some(end_time) = &filter.end_time {
        query = query.bind(end_time);
    }
    query
}

#[async_trait]
impl MetricsHistoryStore for PostgresQosStore {
    async fn append_sample(&self, sample: &QosSample) -> Result<()> {
        let metrics =
            serde_json::to_value(&sample.metrics).context("serialize sample metrics")?;
        sqlx::query(
            r#"
            INSERT INTO qos_samples (session_id, ts, metrics, user_id, user_role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&sample.session_id)
        .bind(sample.timestamp)
        .bind(metrics)
        .bind(&sample.user_id)
        .bind(&sample.user_role)
        .execute(self.pool())
        .await
        .context("insert qos sample")?;
        Ok(())
    }

    async fn recent_samples(&self, session_id: &str, limit: i64) -> Result<Vec<QosSample>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, ts, metrics, user_id, user_role
            FROM qos_samples
            WHERE session_id = $1
            ORDER BY ts DESC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .context("load recent qos samples")?;

        rows.iter().map(sample_from_row).collect()
    }

    async fn samples_asc(&self, session_id: &str) -> Result<Vec<QosSample>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, ts, metrics, user_id, user_role
            FROM qos_samples
            WHERE session_id = $1
            ORDER BY ts ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool())
        .await
        .context("load qos samples for timeline")?;

        rows.iter().map(sample_from_row).collect()
    }
}

#[async_trait]
impl ReportStore for PostgresQosStore {
    async fn create_report(&self, report: &QosSessionReport) -> Result<()> {
        let issues = serde_json::to_value(&report.issues).context("serialize report issues")?;
        sqlx::query(
            r#"
            INSERT INTO qos_reports (
                report_id, session_id, doctor_id, patient_id,
                start_time, end_time, duration_seconds,
                avg_latency, avg_jitter, avg_packet_loss,
                avg_upload_mbps, avg_download_mbps,
                quality_score, issues, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&report.report_id)
        .bind(&report.session_id)
        .bind(&report.doctor_id)
        .bind(&report.patient_id)
        .bind(report.start_time)
        .bind(report.end_time)
        .bind(report.duration_seconds)
        .bind(report.avg_latency)
        .bind(report.avg_jitter)
        .bind(report.avg_packet_loss)
        .bind(report.avg_bandwidth.upload_mbps)
        .bind(report.avg_bandwidth.download_mbps)
        .bind(report.quality_score as i16)
        .bind(issues)
        .bind(report.active)
        .execute(self.pool())
        .await
        .context("insert qos report")?;
        Ok(())
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        sort: &ReportSort,
        page: &ReportPage,
    ) -> Result<(Vec<QosSessionReport>, u64)> {
        let (where_clause, bind_count) = report_conditions(filter);
        let direction = if sort.ascending { "ASC" } else { "DESC" };

        let list_sql = format!(
            r#"
            SELECT report_id, session_id, doctor_id, patient_id,
                   start_time, end_time, duration_seconds,
                   avg_latency, avg_jitter, avg_packet_loss,
                   avg_upload_mbps, avg_download_mbps,
                   quality_score, issues, active
            FROM qos_reports
            {where_clause}
            ORDER BY {column} {direction}
            LIMIT ${limit_idx} OFFSET ${offset_idx}
            "#,
            where_clause = where_clause,
            column = sort_column(&sort.field),
            direction = direction,
            limit_idx = bind_count + 1,
            offset_idx = bind_count + 2,
        );

        let rows = bind_report_filter(sqlx::query(&list_sql), filter)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(self.pool())
            .await
            .context("list qos reports")?;
        let reports: Result<Vec<_>> = rows.iter().map(report_from_row).collect();

        // total 独立于分页窗口
        let count_sql = format!("SELECT COUNT(*) FROM qos_reports {}", where_clause);
        let total: i64 = bind_report_filter(sqlx::query(&count_sql), filter)
            .fetch_one(self.pool())
            .await
            .context("count qos reports")?
            .get(0);

        Ok((reports?, total.max(0) as u64))
    }

    async fn deactivate_report(&self, report_id: &str) -> Result<()> {
        sqlx::query("UPDATE qos_reports SET active = FALSE WHERE report_id = $1")
            .bind(report_id)
            .execute(self.pool())
            .await
            .context("deactivate qos report")?;
        Ok(())
    }
}

#[async_trait]
impl AlertStore for PostgresQosStore {
    async fn create_alert(&self, alert: &QosAlert) -> Result<()> {
        let metrics = serde_json::to_value(&alert.metrics).context("serialize alert metrics")?;
        sqlx::query(
            r#"
            INSERT INTO qos_alerts (
                alert_id, session_id, issue, severity, metrics,
                doctor_id, patient_id, created_at, resolved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&alert.alert_id)
        .bind(&alert.session_id)
        .bind(&alert.issue)
        .bind(alert.severity.as_str())
        .bind(metrics)
        .bind(&alert.doctor_id)
        .bind(&alert.patient_id)
        .bind(alert.created_at)
        .bind(alert.resolved)
        .execute(self.pool())
        .await
        .context("insert qos alert")?;
        Ok(())
    }

    async fn resolve_alert(&self, alert_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE qos_alerts SET resolved = TRUE WHERE alert_id = $1")
            .bind(alert_id)
            .execute(self.pool())
            .await
            .context("resolve qos alert")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_session_alerts(&self, session_id: &str) -> Result<Vec<QosAlert>> {
        let rows = sqlx::query(
            r#"
            SELECT alert_id, session_id, issue, severity, metrics,
                   doctor_id, patient_id, created_at, resolved
            FROM qos_alerts
            WHERE session_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(self.pool())
        .await
        .context("list session alerts")?;

        rows.iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn sort_column_whitelists_fields() {
        assert_eq!(sort_column("qualityScore"), "quality_score");
        assert_eq!(sort_column("startTime"), "start_time");
        assert_eq!(sort_column("'; DROP TABLE qos_reports; --"), "start_time");
    }

    #[test]
    fn report_conditions_number_binds_in_order() {
        let filter = ReportFilter {
            doctor_id: Some("doc-1".into()),
            session_id: Some("s-1".into()),
            end_time: Some(Utc::now()),
            ..ReportFilter::default()
        };
        let (clause, binds) = report_conditions(&filter);
        assert_eq!(binds, 3);
        assert!(clause.starts_with("WHERE active = TRUE"));
        assert!(clause.contains("doctor_id = $1"));
        assert!(clause.contains("session_id = $2"));
        assert!(clause.contains("end_time <= $3"));
    }

    #[test]
    fn unfiltered_conditions_keep_soft_delete_guard() {
        let (clause, binds) = report_conditions(&ReportFilter::default());
        assert_eq!(binds, 0);
        assert_eq!(clause, "WHERE active = TRUE");
    }
}
