//! HTTP 边界（REST）
//!
//! 摄入与报表查询的对外接口。负载使用 camelCase JSON；
//! 形状校验由 serde 在边界完成，未知会话一律返回空/null 而不是错误页。

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use crate::application::commands::{
    DeactivateReportCommand, FinalizeSessionCommand, RecordMetricsCommand, ResolveAlertCommand,
    SendQualityAlertCommand,
};
use crate::application::queries::{
    AggregatedMetricsQuery, ListReportsQuery, RealtimeMetricsQuery, SessionAlertsQuery,
    SessionMetricsQuery, SessionTimelineQuery,
};
use crate::domain::model::{AlertSeverity, QosMetrics, QosSample, ReportFilter, ReportPage, ReportSort};
use crate::domain::service::DispatchOutcome;
use crate::service::wire::ApplicationContext;

type AppState = Arc<ApplicationContext>;
type HandlerError = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/qos/metrics", post(record_metrics))
        .route("/api/v1/qos/reports", get(list_reports))
        .route("/api/v1/qos/reports/:id", delete(deactivate_report))
        .route("/api/v1/qos/aggregated", get(aggregated_metrics))
        .route("/api/v1/qos/sessions/:id/metrics", get(session_metrics))
        .route("/api/v1/qos/sessions/:id/timeline", get(session_timeline))
        .route("/api/v1/qos/sessions/:id/finalize", post(finalize_session))
        .route("/api/v1/qos/realtime/:id", get(realtime_metrics))
        .route("/api/v1/qos/alerts", get(session_alerts).post(send_alert))
        .route("/api/v1/qos/alerts/:id/resolve", post(resolve_alert))
        .with_state(state)
}

/// 硬失败（持久存储不可用等）统一映射为 500
fn internal_error(err: anyhow::Error) -> HandlerError {
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}

// ── GET /health ─────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "qos-monitor" }))
}

// ── POST /api/v1/qos/metrics ────────────────────────────────────────────

async fn record_metrics(
    State(state): State<AppState>,
    Json(sample): Json<QosSample>,
) -> Result<Json<Value>, HandlerError> {
    state
        .command_handler
        .handle_record_metrics(RecordMetricsCommand { sample })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "accepted": true })))
}

// ── GET /api/v1/qos/reports ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportsParams {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    session_id: Option<String>,
    doctor_id: Option<String>,
    patient_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    sort_by: Option<String>,
    order: Option<String>,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportsParams>,
) -> Result<Json<Value>, HandlerError> {
    let sort = params.sort_by.map(|field| ReportSort {
        field,
        ascending: params
            .order
            .as_deref()
            .is_some_and(|order| order.eq_ignore_ascii_case("asc")),
    });
    let page = ReportPage {
        limit: params.limit.unwrap_or(20).clamp(1, 500),
        offset: params.offset.unwrap_or(0).max(0),
    };
    let query = ListReportsQuery {
        filter: ReportFilter {
            doctor_id: params.doctor_id,
            patient_id: params.patient_id,
            session_id: params.session_id,
            start_time: params.start_date,
            end_time: params.end_date,
        },
        sort,
        page: Some(page),
    };

    let (reports, total) = state
        .query_handler
        .handle_list_reports(query)
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "reports": reports, "total": total })))
}

// ── DELETE /api/v1/qos/reports/:id ──────────────────────────────────────

async fn deactivate_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    state
        .command_handler
        .handle_deactivate_report(DeactivateReportCommand { report_id })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "deactivated": true })))
}

// ── GET /api/v1/qos/aggregated ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedParams {
    doctor_id: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

async fn aggregated_metrics(
    State(state): State<AppState>,
    Query(params): Query<AggregatedParams>,
) -> Result<Json<Value>, HandlerError> {
    let aggregated = state
        .query_handler
        .handle_aggregated_metrics(AggregatedMetricsQuery {
            doctor_id: params.doctor_id,
            start_date: params.start_date,
            end_date: params.end_date,
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(aggregated)))
}

// ── GET /api/v1/qos/sessions/:id/metrics ────────────────────────────────

async fn session_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let summary = state
        .query_handler
        .handle_session_metrics(SessionMetricsQuery { session_id })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(summary)))
}

// ── GET /api/v1/qos/sessions/:id/timeline ───────────────────────────────

async fn session_timeline(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let timeline = state
        .query_handler
        .handle_session_timeline(SessionTimelineQuery { session_id })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(timeline)))
}

// ── POST /api/v1/qos/sessions/:id/finalize ──────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeBody {
    doctor_id: Option<String>,
    patient_id: Option<String>,
}

async fn finalize_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Option<Json<FinalizeBody>>,
) -> Result<Json<Value>, HandlerError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let report = state
        .command_handler
        .handle_finalize_session(FinalizeSessionCommand {
            session_id,
            doctor_id: body.doctor_id,
            patient_id: body.patient_id,
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(report)))
}

// ── GET /api/v1/qos/realtime/:id ────────────────────────────────────────

async fn realtime_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Value> {
    let metrics = state
        .query_handler
        .handle_realtime_metrics(RealtimeMetricsQuery { session_id })
        .await;
    Json(json!(metrics))
}

// ── POST /api/v1/qos/alerts ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendAlertBody {
    session_id: String,
    issue: String,
    severity: AlertSeverity,
    metrics: QosMetrics,
    doctor_id: Option<String>,
    patient_id: Option<String>,
}

/// 受信调用方的手动告警入口，允许上送分析器自身不会产生的 critical 级别
async fn send_alert(
    State(state): State<AppState>,
    Json(body): Json<SendAlertBody>,
) -> Result<Json<Value>, HandlerError> {
    let outcome = state
        .command_handler
        .handle_send_quality_alert(SendQualityAlertCommand {
            session_id: body.session_id,
            issue: body.issue,
            severity: body.severity,
            metrics: body.metrics,
            doctor_id: body.doctor_id,
            patient_id: body.patient_id,
        })
        .await
        .map_err(internal_error)?;
    match outcome {
        DispatchOutcome::Dispatched { alert_id } => {
            Ok(Json(json!({ "dispatched": true, "alertId": alert_id })))
        }
        DispatchOutcome::Suppressed => {
            Ok(Json(json!({ "dispatched": false, "suppressed": true })))
        }
    }
}

// ── GET /api/v1/qos/alerts?sessionId= ───────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertsParams {
    session_id: String,
}

async fn session_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsParams>,
) -> Result<Json<Value>, HandlerError> {
    let alerts = state
        .query_handler
        .handle_session_alerts(SessionAlertsQuery {
            session_id: params.session_id,
        })
        .await
        .map_err(internal_error)?;
    Ok(Json(json!(alerts)))
}

// ── POST /api/v1/qos/alerts/:id/resolve ─────────────────────────────────

async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Result<Json<Value>, HandlerError> {
    let resolved = state
        .command_handler
        .handle_resolve_alert(ResolveAlertCommand { alert_id })
        .await
        .map_err(internal_error)?;
    if resolved {
        Ok(Json(json!({ "resolved": true })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "alert not found" })),
        ))
    }
}
