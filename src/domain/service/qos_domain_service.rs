//! QoS 管线领域服务 - 采样摄入与告警分发
//!
//! 摄入路径：历史存储为硬依赖，缓存写入与告警通知均为尽力而为；
//! 告警先持久化再扇出，两阶段之间不构成事务，通知失败不回滚告警记录。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::model::{AlertSeverity, QosAlert, QosMetrics, QosSample};
use crate::domain::repository::{
    AlertStoreRef, ChannelKey, MetricsHistoryStoreRef, NotificationChannel, NotificationPriority,
    NotificationRequest, NotificationSenderRef, RealtimeChannelRef, RealtimeMetricsCacheRef,
    SessionDirectoryRef, severity_priority,
};
use crate::domain::service::quality::analyze_quality;

/// 告警分发输入
#[derive(Debug, Clone)]
pub struct AlertDispatch {
    pub session_id: String,
    pub issue: String,
    pub severity: AlertSeverity,
    pub metrics: QosMetrics,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}

/// 分发结果：告警持久化成功即视为成功，通知环节只记录结果
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Dispatched { alert_id: String },
    /// 同一 (session, issue) 仍在去重窗口内
    Suppressed,
}

/// 管线领域服务配置
#[derive(Debug, Clone)]
pub struct QosPipelineConfig {
    /// 实时缓存条目 TTL
    pub realtime_ttl: Duration,
    /// 告警去重窗口；为零则关闭去重
    pub alert_dedup_window: Duration,
}

impl Default for QosPipelineConfig {
    fn default() -> Self {
        Self {
            realtime_ttl: Duration::from_secs(60),
            alert_dedup_window: Duration::from_secs(300),
        }
    }
}

pub struct QosDomainService {
    history: MetricsHistoryStoreRef,
    realtime_cache: RealtimeMetricsCacheRef,
    alert_store: AlertStoreRef,
    channel: RealtimeChannelRef,
    notifier: NotificationSenderRef,
    sessions: Option<SessionDirectoryRef>,
    config: QosPipelineConfig,
}

impl QosDomainService {
    pub fn new(
        history: MetricsHistoryStoreRef,
        realtime_cache: RealtimeMetricsCacheRef,
        alert_store: AlertStoreRef,
        channel: RealtimeChannelRef,
        notifier: NotificationSenderRef,
        sessions: Option<SessionDirectoryRef>,
        config: QosPipelineConfig,
    ) -> Self {
        Self {
            history,
            realtime_cache,
            alert_store,
            channel,
            notifier,
            sessions,
            config,
        }
    }

    /// 摄入一条采样（业务逻辑）。
    ///
    /// 历史写入失败向调用方传播；缓存写入失败只记日志；
    /// 触发告警时以分离任务分发，不阻塞上报方的下一次采样。
    pub async fn record_metrics(&self, sample: QosSample) -> Result<()> {
        self.history
            .append_sample(&sample)
            .await
            .context("append qos sample to history store")?;

        if let Err(e) = self
            .realtime_cache
            .put_latest(&sample.session_id, &sample.metrics, self.config.realtime_ttl)
            .await
        {
            warn!(
                session_id = %sample.session_id,
                error = %e,
                "realtime cache write failed, continuing"
            );
        }

        let analysis = analyze_quality(&sample.metrics);
        if analysis.needs_alert() {
            let (doctor_hint, patient_hint) = sample.participant_hint();
            let dispatch = AlertDispatch {
                session_id: sample.session_id.clone(),
                issue: analysis.issue_summary(),
                severity: analysis.severity,
                metrics: sample.metrics.clone(),
                doctor_id: doctor_hint,
                patient_id: patient_hint,
            };

            let service = self.clone_for_dispatch();
            tokio::spawn(async move {
                if let Err(e) = service.dispatch_alert(dispatch).await {
                    error!(error = %e, "quality alert dispatch failed");
                }
            });
        }

        Ok(())
    }

    /// 分发质量告警（业务逻辑）。
    ///
    /// 阶段一持久化告警记录，失败则整个操作失败；
    /// 阶段二实时事件与各通知渠道全部尽力而为。
    pub async fn dispatch_alert(&self, mut dispatch: AlertDispatch) -> Result<DispatchOutcome> {
        if !self.acquire_dedup_window(&dispatch).await {
            debug!(
                session_id = %dispatch.session_id,
                issue = %dispatch.issue,
                "duplicate alert suppressed within dedup window"
            );
            return Ok(DispatchOutcome::Suppressed);
        }

        let session_summary = self.lookup_session(&dispatch.session_id).await;
        if let Some(summary) = &session_summary {
            if dispatch.doctor_id.is_none() {
                dispatch.doctor_id = summary.doctor_id.clone();
            }
            if dispatch.patient_id.is_none() {
                dispatch.patient_id = summary.patient_id.clone();
            }
        }

        let alert = QosAlert {
            alert_id: Uuid::new_v4().to_string(),
            session_id: dispatch.session_id.clone(),
            issue: dispatch.issue.clone(),
            severity: dispatch.severity,
            metrics: dispatch.metrics.clone(),
            doctor_id: dispatch.doctor_id.clone(),
            patient_id: dispatch.patient_id.clone(),
            created_at: Utc::now(),
            resolved: false,
        };

        if let Err(e) = self.alert_store.create_alert(&alert).await {
            // 落库失败时回收去重窗口：没有记录在案的告警不得压掉后续告警
            self.release_dedup_window(&dispatch).await;
            return Err(e).context("persist qos alert");
        }

        info!(
            alert_id = %alert.alert_id,
            session_id = %alert.session_id,
            severity = alert.severity.as_str(),
            "quality alert persisted"
        );

        self.emit_realtime_events(&alert).await;
        self.fan_out_notifications(&alert, session_summary.as_ref()).await;

        Ok(DispatchOutcome::Dispatched {
            alert_id: alert.alert_id,
        })
    }

    async fn acquire_dedup_window(&self, dispatch: &AlertDispatch) -> bool {
        if self.config.alert_dedup_window.is_zero() {
            return true;
        }
        match self
            .realtime_cache
            .acquire_alert_window(
                &dispatch.session_id,
                &dispatch.issue,
                self.config.alert_dedup_window,
            )
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                // 去重只是节流手段，守卫不可用时宁可重复告警
                warn!(error = %e, "alert dedup guard unavailable, skipping suppression");
                true
            }
        }
    }

    async fn release_dedup_window(&self, dispatch: &AlertDispatch) {
        if self.config.alert_dedup_window.is_zero() {
            return;
        }
        if let Err(e) = self
            .realtime_cache
            .release_alert_window(&dispatch.session_id, &dispatch.issue)
            .await
        {
            warn!(
                session_id = %dispatch.session_id,
                issue = %dispatch.issue,
                error = %e,
                "failed to release alert dedup window"
            );
        }
    }

    async fn lookup_session(
        &self,
        session_id: &str,
    ) -> Option<crate::domain::model::CallSessionSummary> {
        let directory = self.sessions.as_ref()?;
        match directory.get_session(session_id).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "session lookup failed");
                None
            }
        }
    }

    /// 实时事件：医生私有频道（有 doctor_id 时）+ 全局监控频道，任何级别都发
    async fn emit_realtime_events(&self, alert: &QosAlert) {
        let event_payload = json!({
            "alertId": alert.alert_id,
            "sessionId": alert.session_id,
            "issue": alert.issue,
            "severity": alert.severity,
            "metrics": alert.metrics,
            "timestamp": alert.created_at,
        });

        if let Some(doctor_id) = &alert.doctor_id {
            if let Err(e) = self
                .channel
                .emit(
                    &ChannelKey::User(doctor_id.clone()),
                    "qos:alert",
                    event_payload.clone(),
                )
                .await
            {
                warn!(doctor_id = %doctor_id, error = %e, "doctor channel emit failed");
            }
        }

        let mut monitoring_payload = event_payload;
        monitoring_payload["doctorId"] = json!(alert.doctor_id);
        monitoring_payload["patientId"] = json!(alert.patient_id);
        if let Err(e) = self
            .channel
            .emit(&ChannelKey::Monitoring, "qos:alert", monitoring_payload)
            .await
        {
            warn!(error = %e, "monitoring channel emit failed");
        }
    }

    /// 按严重级别扇出通知，每条失败只记日志
    async fn fan_out_notifications(
        &self,
        alert: &QosAlert,
        session_summary: Option<&crate::domain::model::CallSessionSummary>,
    ) {
        if alert.severity >= AlertSeverity::High {
            if let Some(doctor_id) = &alert.doctor_id {
                let channels = if alert.severity == AlertSeverity::Critical {
                    vec![
                        NotificationChannel::Push,
                        NotificationChannel::Email,
                        NotificationChannel::InApp,
                    ]
                } else {
                    vec![NotificationChannel::Push, NotificationChannel::InApp]
                };
                let request = NotificationRequest {
                    user_id: doctor_id.clone(),
                    kind: "system_alert".to_string(),
                    priority: severity_priority(alert.severity),
                    title: "Call quality alert".to_string(),
                    message: format!(
                        "{} detected in the current session. Latency: {}ms, packet loss: {}%",
                        alert.issue,
                        alert.metrics.latency_ms.unwrap_or(0.0),
                        alert.metrics.packet_loss_percent.unwrap_or(0.0),
                    ),
                    data: json!({
                        "alertId": alert.alert_id,
                        "sessionId": alert.session_id,
                        "issue": alert.issue,
                        "severity": alert.severity,
                        "metrics": alert.metrics,
                    }),
                    channels,
                };
                self.send_notification(&request, "doctor").await;
            }

            // 给患者的安抚通知：用词通用，不携带原始指标
            if let Some(patient_id) = &alert.patient_id {
                let request = NotificationRequest {
                    user_id: patient_id.clone(),
                    kind: "system_alert".to_string(),
                    priority: NotificationPriority::Medium,
                    title: "Connection issue detected".to_string(),
                    message: "We are experiencing connection problems. Your doctor has been notified."
                        .to_string(),
                    data: json!({
                        "sessionId": alert.session_id,
                        "severity": alert.severity,
                    }),
                    channels: vec![NotificationChannel::Push, NotificationChannel::InApp],
                };
                self.send_notification(&request, "patient").await;
            }

            if alert.severity == AlertSeverity::Critical {
                let data = json!({
                    "alertId": alert.alert_id,
                    "sessionId": alert.session_id,
                    "issue": alert.issue,
                    "metrics": alert.metrics,
                    "doctorId": alert.doctor_id,
                    "patientId": alert.patient_id,
                    "sessionData": session_summary,
                });
                if let Err(e) = self
                    .notifier
                    .create_from_template("technical_alert", "support", data)
                    .await
                {
                    warn!(alert_id = %alert.alert_id, error = %e, "support notification failed");
                }
            }
        } else if let Some(doctor_id) = &alert.doctor_id {
            // 低/中级别：仅医生的一条低优先级站内通知
            let request = NotificationRequest {
                user_id: doctor_id.clone(),
                kind: "info".to_string(),
                priority: NotificationPriority::Low,
                title: "Connection quality".to_string(),
                message: format!("{} detected. Call quality may be affected.", alert.issue),
                data: json!({
                    "sessionId": alert.session_id,
                    "metrics": alert.metrics,
                }),
                channels: vec![NotificationChannel::InApp],
            };
            self.send_notification(&request, "doctor").await;
        }
    }

    async fn send_notification(&self, request: &NotificationRequest, audience: &str) {
        if let Err(e) = self.notifier.create_notification(request).await {
            warn!(
                user_id = %request.user_id,
                audience = audience,
                error = %e,
                "notification dispatch failed, alert record remains authoritative"
            );
        }
    }

    /// 解除告警：resolved 是告警唯一允许的变更
    pub async fn resolve_alert(&self, alert_id: &str) -> Result<bool> {
        let resolved = self.alert_store.resolve_alert(alert_id).await?;
        if resolved {
            info!(alert_id = %alert_id, "quality alert resolved");
        }
        Ok(resolved)
    }

    pub async fn session_alerts(&self, session_id: &str) -> Result<Vec<QosAlert>> {
        self.alert_store.list_session_alerts(session_id).await
    }

    /// 克隆服务用于分离的告警分发任务（只克隆 Arc 句柄）
    fn clone_for_dispatch(&self) -> Self {
        Self {
            history: Arc::clone(&self.history),
            realtime_cache: Arc::clone(&self.realtime_cache),
            alert_store: Arc::clone(&self.alert_store),
            channel: Arc::clone(&self.channel),
            notifier: Arc::clone(&self.notifier),
            sessions: self.sessions.as_ref().map(Arc::clone),
            config: self.config.clone(),
        }
    }
}
