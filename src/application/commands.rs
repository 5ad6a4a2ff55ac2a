use crate::domain::model::{AlertSeverity, QosMetrics, QosSample};

/// 采样上报命令
#[derive(Debug, Clone)]
pub struct RecordMetricsCommand {
    pub sample: QosSample,
}

/// 手动触发质量告警命令（边界之外的调用方可以上送 critical）
#[derive(Debug, Clone)]
pub struct SendQualityAlertCommand {
    pub session_id: String,
    pub issue: String,
    pub severity: AlertSeverity,
    pub metrics: QosMetrics,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}

/// 解除告警命令
#[derive(Debug, Clone)]
pub struct ResolveAlertCommand {
    pub alert_id: String,
}

/// 报告软删除命令
#[derive(Debug, Clone)]
pub struct DeactivateReportCommand {
    pub report_id: String,
}

/// 会话报告定稿命令
#[derive(Debug, Clone)]
pub struct FinalizeSessionCommand {
    pub session_id: String,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}
