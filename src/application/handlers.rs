//! 应用层命令/查询处理器 - 领域服务的薄封装

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::application::commands::{
    DeactivateReportCommand, FinalizeSessionCommand, RecordMetricsCommand, ResolveAlertCommand,
    SendQualityAlertCommand,
};
use crate::application::queries::{
    AggregatedMetricsQuery, ListReportsQuery, RealtimeMetricsQuery, SessionAlertsQuery,
    SessionMetricsQuery, SessionTimelineQuery,
};
use crate::domain::model::{
    AggregatedQos, QosAlert, QosMetrics, QosSessionReport, SessionQosSummary, TimelinePoint,
};
use crate::domain::service::{AlertDispatch, DispatchOutcome, QosDomainService, ReportDomainService};

/// QoS 命令处理器
pub struct QosCommandHandler {
    pipeline: Arc<QosDomainService>,
    reports: Arc<ReportDomainService>,
}

impl QosCommandHandler {
    pub fn new(pipeline: Arc<QosDomainService>, reports: Arc<ReportDomainService>) -> Self {
        Self { pipeline, reports }
    }

    /// 处理采样上报命令
    pub async fn handle_record_metrics(&self, command: RecordMetricsCommand) -> Result<()> {
        debug!(
            session_id = %command.sample.session_id,
            user_role = %command.sample.user_role,
            "Handling record metrics command"
        );
        self.pipeline.record_metrics(command.sample).await
    }

    /// 处理手动告警命令
    pub async fn handle_send_quality_alert(
        &self,
        command: SendQualityAlertCommand,
    ) -> Result<DispatchOutcome> {
        debug!(
            session_id = %command.session_id,
            severity = command.severity.as_str(),
            "Handling send quality alert command"
        );
        self.pipeline
            .dispatch_alert(AlertDispatch {
                session_id: command.session_id,
                issue: command.issue,
                severity: command.severity,
                metrics: command.metrics,
                doctor_id: command.doctor_id,
                patient_id: command.patient_id,
            })
            .await
    }

    /// 处理告警解除命令
    pub async fn handle_resolve_alert(&self, command: ResolveAlertCommand) -> Result<bool> {
        self.pipeline.resolve_alert(&command.alert_id).await
    }

    /// 处理报告软删除命令
    pub async fn handle_deactivate_report(&self, command: DeactivateReportCommand) -> Result<()> {
        self.reports.deactivate_report(&command.report_id).await
    }

    /// 处理会话定稿命令
    pub async fn handle_finalize_session(
        &self,
        command: FinalizeSessionCommand,
    ) -> Result<Option<QosSessionReport>> {
        debug!(session_id = %command.session_id, "Handling finalize session command");
        self.reports
            .finalize_session(&command.session_id, command.doctor_id, command.patient_id)
            .await
    }
}

/// QoS 查询处理器
pub struct QosQueryHandler {
    pipeline: Arc<QosDomainService>,
    reports: Arc<ReportDomainService>,
}

impl QosQueryHandler {
    pub fn new(pipeline: Arc<QosDomainService>, reports: Arc<ReportDomainService>) -> Self {
        Self { pipeline, reports }
    }

    pub async fn handle_list_reports(
        &self,
        query: ListReportsQuery,
    ) -> Result<(Vec<QosSessionReport>, u64)> {
        self.reports
            .list_reports(
                &query.filter,
                &query.sort.unwrap_or_default(),
                &query.page.unwrap_or_default(),
            )
            .await
    }

    pub async fn handle_aggregated_metrics(
        &self,
        query: AggregatedMetricsQuery,
    ) -> Result<AggregatedQos> {
        self.reports
            .aggregated_metrics(query.doctor_id.as_deref(), query.start_date, query.end_date)
            .await
    }

    pub async fn handle_session_metrics(
        &self,
        query: SessionMetricsQuery,
    ) -> Result<Option<SessionQosSummary>> {
        self.reports.session_metrics(&query.session_id).await
    }

    pub async fn handle_session_timeline(
        &self,
        query: SessionTimelineQuery,
    ) -> Result<Vec<TimelinePoint>> {
        self.reports.session_timeline(&query.session_id).await
    }

    pub async fn handle_realtime_metrics(&self, query: RealtimeMetricsQuery) -> Option<QosMetrics> {
        self.reports.realtime_metrics(&query.session_id).await
    }

    pub async fn handle_session_alerts(&self, query: SessionAlertsQuery) -> Result<Vec<QosAlert>> {
        self.pipeline.session_alerts(&query.session_id).await
    }
}
