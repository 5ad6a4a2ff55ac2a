pub mod qos_domain_service;
pub mod quality;
pub mod report_domain_service;

pub use qos_domain_service::{AlertDispatch, DispatchOutcome, QosDomainService, QosPipelineConfig};
pub use report_domain_service::ReportDomainService;
