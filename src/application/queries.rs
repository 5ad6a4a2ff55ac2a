use chrono::{DateTime, Utc};

use crate::domain::model::{ReportFilter, ReportPage, ReportSort};

/// 报告列表查询
#[derive(Debug, Clone, Default)]
pub struct ListReportsQuery {
    pub filter: ReportFilter,
    pub sort: Option<ReportSort>,
    pub page: Option<ReportPage>,
}

/// 聚合指标查询
#[derive(Debug, Clone, Default)]
pub struct AggregatedMetricsQuery {
    pub doctor_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// 单会话统计查询
#[derive(Debug, Clone)]
pub struct SessionMetricsQuery {
    pub session_id: String,
}

/// 会话时间线查询
#[derive(Debug, Clone)]
pub struct SessionTimelineQuery {
    pub session_id: String,
}

/// 实时指标查询
#[derive(Debug, Clone)]
pub struct RealtimeMetricsQuery {
    pub session_id: String,
}

/// 会话告警列表查询
#[derive(Debug, Clone)]
pub struct SessionAlertsQuery {
    pub session_id: String,
}
