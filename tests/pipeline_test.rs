// 集成测试套件 - 用内存假实现端口，验证采样摄入到告警/报告的完整链路
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use qos_monitor::domain::model::{
    AggregatedQos, AlertSeverity, Bandwidth, ConnectionInfo, ConnectionState, QosAlert,
    QosMetrics, QosSample, QosSessionReport, ReportFilter, ReportPage, ReportSort,
};
use qos_monitor::domain::repository::{
    AggregateCache, AlertStore, ChannelKey, MetricsHistoryStore, NotificationChannel,
    NotificationRequest, NotificationSender, RealtimeChannel, RealtimeMetricsCache, ReportStore,
};
use qos_monitor::domain::service::{
    AlertDispatch, DispatchOutcome, QosDomainService, QosPipelineConfig, ReportDomainService,
};

// ── 内存假实现 ──────────────────────────────────────────────────────────

#[derive(Default)]
struct InMemoryHistory {
    samples: Mutex<Vec<QosSample>>,
}

#[async_trait]
impl MetricsHistoryStore for InMemoryHistory {
    async fn append_sample(&self, sample: &QosSample) -> Result<()> {
        self.samples.lock().await.push(sample.clone());
        Ok(())
    }

    async fn recent_samples(&self, session_id: &str, limit: i64) -> Result<Vec<QosSample>> {
        let samples = self.samples.lock().await;
        let mut matching: Vec<QosSample> = samples
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| std::cmp::Reverse(s.timestamp));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn samples_asc(&self, session_id: &str) -> Result<Vec<QosSample>> {
        let samples = self.samples.lock().await;
        let mut matching: Vec<QosSample> = samples
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.timestamp);
        Ok(matching)
    }
}

#[derive(Default)]
struct InMemoryReports {
    reports: Mutex<Vec<QosSessionReport>>,
}

#[async_trait]
impl ReportStore for InMemoryReports {
    async fn create_report(&self, report: &QosSessionReport) -> Result<()> {
        self.reports.lock().await.push(report.clone());
        Ok(())
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        _sort: &ReportSort,
        page: &ReportPage,
    ) -> Result<(Vec<QosSessionReport>, u64)> {
        let reports = self.reports.lock().await;
        let mut matching: Vec<QosSessionReport> = reports
            .iter()
            .filter(|r| r.active)
            .filter(|r| {
                filter
                    .session_id
                    .as_ref()
                    .is_none_or(|id| r.session_id == *id)
            })
            .filter(|r| {
                filter
                    .doctor_id
                    .as_ref()
                    .is_none_or(|id| r.doctor_id.as_ref() == Some(id))
            })
            .filter(|r| {
                filter
                    .patient_id
                    .as_ref()
                    .is_none_or(|id| r.patient_id.as_ref() == Some(id))
            })
            .filter(|r| filter.start_time.is_none_or(|t| r.start_time >= t))
            .filter(|r| filter.end_time.is_none_or(|t| r.end_time <= t))
            .cloned()
            .collect();
        matching.sort_by_key(|r| std::cmp::Reverse(r.start_time));
        let total = matching.len() as u64;
        let window: Vec<QosSessionReport> = matching
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect();
        Ok((window, total))
    }

    async fn deactivate_report(&self, report_id: &str) -> Result<()> {
        let mut reports = self.reports.lock().await;
        for report in reports.iter_mut() {
            if report.report_id == report_id {
                report.active = false;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryAlerts {
    alerts: Mutex<Vec<QosAlert>>,
    fail_next: AtomicBool,
}

#[async_trait]
impl AlertStore for InMemoryAlerts {
    async fn create_alert(&self, alert: &QosAlert) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("alert store unavailable"));
        }
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }

    async fn resolve_alert(&self, alert_id: &str) -> Result<bool> {
        let mut alerts = self.alerts.lock().await;
        for alert in alerts.iter_mut() {
            if alert.alert_id == alert_id && !alert.resolved {
                alert.resolved = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn list_session_alerts(&self, session_id: &str) -> Result<Vec<QosAlert>> {
        let alerts = self.alerts.lock().await;
        Ok(alerts
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct InMemoryRealtimeCache {
    latest: Mutex<Vec<(String, QosMetrics)>>,
    windows: Mutex<HashSet<String>>,
    fail_writes: AtomicBool,
}

#[async_trait]
impl RealtimeMetricsCache for InMemoryRealtimeCache {
    async fn put_latest(
        &self,
        session_id: &str,
        metrics: &QosMetrics,
        _ttl: Duration,
    ) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("cache connection refused"));
        }
        let mut latest = self.latest.lock().await;
        latest.retain(|(id, _)| id != session_id);
        latest.push((session_id.to_string(), metrics.clone()));
        Ok(())
    }

    async fn get_latest(&self, session_id: &str) -> Result<Option<QosMetrics>> {
        let latest = self.latest.lock().await;
        Ok(latest
            .iter()
            .find(|(id, _)| id == session_id)
            .map(|(_, m)| m.clone()))
    }

    async fn acquire_alert_window(
        &self,
        session_id: &str,
        issue: &str,
        _ttl: Duration,
    ) -> Result<bool> {
        let key = format!("{}:{}", session_id, issue);
        Ok(self.windows.lock().await.insert(key))
    }

    async fn release_alert_window(&self, session_id: &str, issue: &str) -> Result<()> {
        let key = format!("{}:{}", session_id, issue);
        self.windows.lock().await.remove(&key);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryAggregateCache {
    entries: Mutex<Vec<(String, AggregatedQos)>>,
}

#[async_trait]
impl AggregateCache for InMemoryAggregateCache {
    async fn get(&self, scope: &str) -> Result<Option<AggregatedQos>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .find(|(s, _)| s == scope)
            .map(|(_, a)| a.clone()))
    }

    async fn put(&self, scope: &str, aggregated: &AggregatedQos, _ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.retain(|(s, _)| s != scope);
        entries.push((scope.to_string(), aggregated.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingChannel {
    events: Mutex<Vec<(String, String, Value)>>,
}

#[async_trait]
impl RealtimeChannel for RecordingChannel {
    async fn emit(&self, channel: &ChannelKey, event: &str, payload: Value) -> Result<()> {
        self.events
            .lock()
            .await
            .push((channel.render(), event.to_string(), payload));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    requests: Mutex<Vec<NotificationRequest>>,
    templates: Mutex<Vec<(String, String, Value)>>,
    fail_all: AtomicBool,
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn create_notification(&self, request: &NotificationRequest) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(anyhow!("notification service unavailable"));
        }
        self.requests.lock().await.push(request.clone());
        Ok(())
    }

    async fn create_from_template(
        &self,
        template: &str,
        recipient: &str,
        data: Value,
    ) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(anyhow!("notification service unavailable"));
        }
        self.templates
            .lock()
            .await
            .push((template.to_string(), recipient.to_string(), data));
        Ok(())
    }
}

// ── 测试装配 ────────────────────────────────────────────────────────────

struct Fixture {
    history: Arc<InMemoryHistory>,
    reports: Arc<InMemoryReports>,
    alerts: Arc<InMemoryAlerts>,
    cache: Arc<InMemoryRealtimeCache>,
    channel: Arc<RecordingChannel>,
    notifier: Arc<RecordingNotifier>,
    pipeline: QosDomainService,
    report_service: ReportDomainService,
}

fn fixture() -> Fixture {
    let history = Arc::new(InMemoryHistory::default());
    let reports = Arc::new(InMemoryReports::default());
    let alerts = Arc::new(InMemoryAlerts::default());
    let cache = Arc::new(InMemoryRealtimeCache::default());
    let aggregate_cache = Arc::new(InMemoryAggregateCache::default());
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let pipeline = QosDomainService::new(
        history.clone(),
        cache.clone(),
        alerts.clone(),
        channel.clone(),
        notifier.clone(),
        None,
        QosPipelineConfig::default(),
    );
    let report_service = ReportDomainService::new(
        history.clone(),
        reports.clone(),
        cache.clone(),
        aggregate_cache,
        None,
        Duration::from_secs(300),
    );

    Fixture {
        history,
        reports,
        alerts,
        cache,
        channel,
        notifier,
        pipeline,
        report_service,
    }
}

fn metrics(latency: f64, jitter: f64, loss: f64, download: f64) -> QosMetrics {
    QosMetrics {
        latency_ms: Some(latency),
        jitter_ms: Some(jitter),
        packet_loss_percent: Some(loss),
        bandwidth: Some(Bandwidth {
            upload_mbps: 2.0,
            download_mbps: download,
        }),
        video: None,
        audio: None,
        connection: ConnectionInfo {
            state: ConnectionState::Stable,
            protocol: "udp".to_string(),
            candidate_type: "host".to_string(),
        },
    }
}

fn sample(session_id: &str, ts: DateTime<Utc>, metrics: QosMetrics) -> QosSample {
    QosSample {
        session_id: session_id.to_string(),
        timestamp: ts,
        metrics,
        user_id: "doctor-7".to_string(),
        user_role: "doctor".to_string(),
    }
}

fn ts(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
}

// ── 摄入与告警 ──────────────────────────────────────────────────────────

#[tokio::test]
async fn high_latency_sample_triggers_persisted_alert_and_fan_out() -> Result<()> {
    let fx = fixture();

    // 250ms 延迟是唯一越界项，分析结果应为 high 级别
    let outcome = fx
        .pipeline
        .dispatch_alert(AlertDispatch {
            session_id: "sess-1".to_string(),
            issue: "High latency detected".to_string(),
            severity: AlertSeverity::High,
            metrics: metrics(250.0, 10.0, 1.0, 5.0),
            doctor_id: Some("doctor-7".to_string()),
            patient_id: Some("patient-3".to_string()),
        })
        .await?;
    assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));

    let alerts = fx.alerts.alerts.lock().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].issue, "High latency detected");
    assert!(!alerts[0].resolved);

    // 实时事件：医生私有频道 + 监控频道
    let events = fx.channel.events.lock().await;
    let channels: Vec<&str> = events.iter().map(|(c, _, _)| c.as_str()).collect();
    assert!(channels.contains(&"user:doctor-7"));
    assert!(channels.contains(&"admin:monitoring"));
    assert!(events.iter().all(|(_, event, _)| event == "qos:alert"));

    // 通知扇出：医生一条带指标的告警，患者一条不带指标的安抚通知
    let requests = fx.notifier.requests.lock().await;
    assert_eq!(requests.len(), 2);
    let doctor = requests.iter().find(|r| r.user_id == "doctor-7").unwrap();
    assert!(doctor.message.contains("250"));
    let patient = requests.iter().find(|r| r.user_id == "patient-3").unwrap();
    assert!(!patient.message.contains("250"));
    assert!(patient.data.get("metrics").is_none());

    // high（非 critical）不升级到 support 模板
    assert!(fx.notifier.templates.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn record_metrics_spawns_alert_for_degraded_sample() -> Result<()> {
    let fx = fixture();

    fx.pipeline
        .record_metrics(sample("sess-2", ts(0), metrics(250.0, 10.0, 1.0, 5.0)))
        .await?;

    // 分发在分离任务里执行，轮询等待落库
    let mut found = false;
    for _ in 0..50 {
        if !fx.alerts.alerts.lock().await.is_empty() {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(found, "spawned alert dispatch never persisted an alert");

    let alerts = fx.alerts.alerts.lock().await;
    assert_eq!(alerts[0].session_id, "sess-2");
    // 上报者是医生，参与者提示应回填 doctor_id
    assert_eq!(alerts[0].doctor_id.as_deref(), Some("doctor-7"));
    assert_eq!(alerts[0].patient_id, None);
    Ok(())
}

#[tokio::test]
async fn healthy_sample_does_not_alert() -> Result<()> {
    let fx = fixture();

    fx.pipeline
        .record_metrics(sample("sess-3", ts(0), metrics(40.0, 5.0, 0.2, 20.0)))
        .await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(fx.alerts.alerts.lock().await.is_empty());
    assert_eq!(fx.history.samples.lock().await.len(), 1);
    // 实时缓存里能读到最新指标
    assert!(fx.cache.get_latest("sess-3").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn cache_failure_does_not_fail_ingestion() -> Result<()> {
    let fx = fixture();
    fx.cache.fail_writes.store(true, Ordering::SeqCst);

    fx.pipeline
        .record_metrics(sample("sess-4", ts(0), metrics(40.0, 5.0, 0.2, 20.0)))
        .await?;

    // 历史写入是硬依赖，其余环节尽力而为
    assert_eq!(fx.history.samples.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn alert_survives_notification_outage() -> Result<()> {
    let fx = fixture();
    fx.notifier.fail_all.store(true, Ordering::SeqCst);

    let outcome = fx
        .pipeline
        .dispatch_alert(AlertDispatch {
            session_id: "sess-5".to_string(),
            issue: "High packet loss detected".to_string(),
            severity: AlertSeverity::Critical,
            metrics: metrics(100.0, 10.0, 8.0, 5.0),
            doctor_id: Some("doctor-7".to_string()),
            patient_id: None,
        })
        .await?;

    // 通知全挂，告警记录依然是成功分发
    assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));
    assert_eq!(fx.alerts.alerts.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn critical_alert_escalates_to_support_template() -> Result<()> {
    let fx = fixture();

    let outcome = fx
        .pipeline
        .dispatch_alert(AlertDispatch {
            session_id: "sess-10".to_string(),
            issue: "Significant packet loss".to_string(),
            severity: AlertSeverity::Critical,
            metrics: metrics(100.0, 10.0, 8.0, 5.0),
            doctor_id: Some("doctor-7".to_string()),
            patient_id: Some("patient-3".to_string()),
        })
        .await?;
    assert!(matches!(outcome, DispatchOutcome::Dispatched { .. }));

    // critical 时医生通知追加 email 渠道
    let requests = fx.notifier.requests.lock().await;
    let doctor = requests.iter().find(|r| r.user_id == "doctor-7").unwrap();
    assert!(doctor.channels.contains(&NotificationChannel::Email));

    // 额外升级到技术支持的模板通知，携带完整上下文
    let templates = fx.notifier.templates.lock().await;
    assert_eq!(templates.len(), 1);
    let (template, recipient, data) = &templates[0];
    assert_eq!(template, "technical_alert");
    assert_eq!(recipient, "support");
    assert_eq!(data["sessionId"], "sess-10");
    assert_eq!(data["doctorId"], "doctor-7");
    assert_eq!(data["patientId"], "patient-3");
    assert!(data.get("alertId").is_some());
    assert!(data.get("metrics").is_some());
    Ok(())
}

#[tokio::test]
async fn failed_alert_persist_releases_dedup_window() -> Result<()> {
    let fx = fixture();
    let dispatch = AlertDispatch {
        session_id: "sess-11".to_string(),
        issue: "High latency detected".to_string(),
        severity: AlertSeverity::High,
        metrics: metrics(250.0, 10.0, 1.0, 5.0),
        doctor_id: Some("doctor-7".to_string()),
        patient_id: None,
    };

    // 第一次落库失败：没有记录在案的告警不得占用去重窗口
    fx.alerts.fail_next.store(true, Ordering::SeqCst);
    assert!(fx.pipeline.dispatch_alert(dispatch.clone()).await.is_err());
    assert!(fx.alerts.alerts.lock().await.is_empty());

    // 存储恢复后的重试必须成功分发，而不是被压掉
    let retry = fx.pipeline.dispatch_alert(dispatch).await?;
    assert!(matches!(retry, DispatchOutcome::Dispatched { .. }));
    assert_eq!(fx.alerts.alerts.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_alert_suppressed_within_window() -> Result<()> {
    let fx = fixture();
    let dispatch = AlertDispatch {
        session_id: "sess-6".to_string(),
        issue: "High latency detected".to_string(),
        severity: AlertSeverity::High,
        metrics: metrics(250.0, 10.0, 1.0, 5.0),
        doctor_id: Some("doctor-7".to_string()),
        patient_id: None,
    };

    let first = fx.pipeline.dispatch_alert(dispatch.clone()).await?;
    let second = fx.pipeline.dispatch_alert(dispatch.clone()).await?;
    assert!(matches!(first, DispatchOutcome::Dispatched { .. }));
    assert!(matches!(second, DispatchOutcome::Suppressed));
    assert_eq!(fx.alerts.alerts.lock().await.len(), 1);

    // 不同问题项不共享去重窗口
    let other = fx
        .pipeline
        .dispatch_alert(AlertDispatch {
            issue: "High packet loss detected".to_string(),
            ..dispatch
        })
        .await?;
    assert!(matches!(other, DispatchOutcome::Dispatched { .. }));
    Ok(())
}

#[tokio::test]
async fn resolve_alert_flips_flag_once() -> Result<()> {
    let fx = fixture();
    let outcome = fx
        .pipeline
        .dispatch_alert(AlertDispatch {
            session_id: "sess-7".to_string(),
            issue: "High latency detected".to_string(),
            severity: AlertSeverity::High,
            metrics: metrics(250.0, 10.0, 1.0, 5.0),
            doctor_id: None,
            patient_id: None,
        })
        .await?;
    let DispatchOutcome::Dispatched { alert_id } = outcome else {
        panic!("expected dispatched outcome");
    };

    assert!(fx.pipeline.resolve_alert(&alert_id).await?);
    assert!(!fx.pipeline.resolve_alert(&alert_id).await?);
    assert!(!fx.pipeline.resolve_alert("missing-alert").await?);
    Ok(())
}

// ── 报告与聚合 ──────────────────────────────────────────────────────────

#[tokio::test]
async fn finalize_session_builds_report_from_samples() -> Result<()> {
    let fx = fixture();
    for i in 0..4 {
        fx.history
            .append_sample(&sample(
                "sess-8",
                ts(i * 30),
                metrics(100.0 + i as f64 * 100.0, 10.0, 1.0, 5.0),
            ))
            .await?;
    }

    let report = fx
        .report_service
        .finalize_session("sess-8", Some("doctor-7".to_string()), None)
        .await?
        .expect("report for session with samples");

    // 平均延迟 (100+200+300+400)/4 = 250
    assert_eq!(report.avg_latency, 250.0);
    assert_eq!(report.duration_seconds, 90);
    assert!(report.quality_score <= 100);
    assert!(report.issues.iter().any(|i| i.contains("latency")));
    assert!(report.active);
    assert_eq!(fx.reports.reports.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn finalize_session_without_samples_returns_none() -> Result<()> {
    let fx = fixture();
    let report = fx.report_service.finalize_session("ghost", None, None).await?;
    assert!(report.is_none());
    assert!(fx.reports.reports.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn list_reports_filters_and_paginates() -> Result<()> {
    let fx = fixture();
    for i in 0..5 {
        let mut report = report_with("sess", i);
        report.doctor_id = Some(if i < 3 { "doctor-7" } else { "doctor-9" }.to_string());
        fx.reports.create_report(&report).await?;
    }

    let filter = ReportFilter {
        doctor_id: Some("doctor-7".to_string()),
        ..Default::default()
    };
    let (window, total) = fx
        .report_service
        .list_reports(&filter, &ReportSort::default(), &ReportPage { limit: 2, offset: 0 })
        .await?;
    assert_eq!(total, 3);
    assert_eq!(window.len(), 2);

    let (rest, total) = fx
        .report_service
        .list_reports(&filter, &ReportSort::default(), &ReportPage { limit: 2, offset: 2 })
        .await?;
    assert_eq!(total, 3);
    assert_eq!(rest.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deactivated_report_disappears_from_listings() -> Result<()> {
    let fx = fixture();
    let report = report_with("sess", 0);
    fx.reports.create_report(&report).await?;

    fx.report_service.deactivate_report(&report.report_id).await?;

    let (window, total) = fx
        .report_service
        .list_reports(
            &ReportFilter::default(),
            &ReportSort::default(),
            &ReportPage::default(),
        )
        .await?;
    assert_eq!(total, 0);
    assert!(window.is_empty());
    Ok(())
}

#[tokio::test]
async fn aggregated_metrics_cached_between_calls() -> Result<()> {
    let fx = fixture();
    for i in 0..3 {
        fx.reports.create_report(&report_with("sess", i)).await?;
    }

    let first = fx.report_service.aggregated_metrics(None, None, None).await?;
    assert_eq!(first.total_sessions, 3);

    // 第二次命中缓存，报告库的后续写入在 TTL 内不可见
    fx.reports.create_report(&report_with("late", 9)).await?;
    let second = fx.report_service.aggregated_metrics(None, None, None).await?;
    assert_eq!(second.total_sessions, 3);
    Ok(())
}

#[tokio::test]
async fn aggregation_honors_one_sided_date_range() -> Result<()> {
    let fx = fixture();
    // 报告 i 的 start_time 为 ts(i*600)
    for i in 0..4 {
        fx.reports.create_report(&report_with("sess", i)).await?;
    }

    // 只给起始时间的开放区间：应剔除前两份报告
    let aggregated = fx
        .report_service
        .aggregated_metrics(None, Some(ts(1200)), None)
        .await?;
    assert_eq!(aggregated.total_sessions, 2);
    Ok(())
}

#[tokio::test]
async fn session_timeline_downsamples_long_sessions() -> Result<()> {
    let fx = fixture();
    for i in 0..1000 {
        fx.history
            .append_sample(&sample("sess-9", ts(i), metrics(50.0, 5.0, 0.5, 10.0)))
            .await?;
    }

    let timeline = fx.report_service.session_timeline("sess-9").await?;
    assert!(timeline.len() <= 100);
    assert!(!timeline.is_empty());
    // 最旧在前
    assert!(timeline.first().unwrap().timestamp <= timeline.last().unwrap().timestamp);
    Ok(())
}

fn report_with(prefix: &str, i: i64) -> QosSessionReport {
    QosSessionReport {
        report_id: format!("{}-report-{}", prefix, i),
        session_id: format!("{}-{}", prefix, i),
        doctor_id: Some("doctor-7".to_string()),
        patient_id: Some("patient-3".to_string()),
        start_time: ts(i * 600),
        end_time: ts(i * 600 + 300),
        duration_seconds: 300,
        avg_latency: 80.0,
        avg_jitter: 10.0,
        avg_packet_loss: 1.0,
        avg_bandwidth: Bandwidth {
            upload_mbps: 2.0,
            download_mbps: 8.0,
        },
        quality_score: 85,
        issues: vec![],
        active: true,
    }
}
