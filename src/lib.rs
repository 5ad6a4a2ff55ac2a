//! qos-monitor
//!
//! 远程问诊通话质量（QoS）监控服务：采样摄入、质量评分与分析、
//! 告警分发、会话报告与仪表盘聚合。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod service;
