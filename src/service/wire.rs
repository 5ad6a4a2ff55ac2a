//! Wire 风格的依赖注入模块
//!
//! 类似 Go 的 Wire 框架，按依赖顺序构建全部组件

use std::sync::Arc;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::handlers::{QosCommandHandler, QosQueryHandler};
use crate::config::QosConfig;
use crate::domain::repository::{
    AggregateCacheRef, AlertStoreRef, MetricsHistoryStoreRef, NotificationSenderRef,
    RealtimeChannelRef, RealtimeMetricsCacheRef, ReportStoreRef, SessionDirectoryRef,
};
use crate::domain::service::{QosDomainService, QosPipelineConfig, ReportDomainService};
use crate::infrastructure::cache::{RedisAggregateCache, RedisRealtimeCache};
use crate::infrastructure::messaging::{
    HttpNotificationSender, HttpSessionDirectory, NoopNotificationSender, RedisRealtimeChannel,
};
use crate::infrastructure::persistence::PostgresQosStore;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub command_handler: Arc<QosCommandHandler>,
    pub query_handler: Arc<QosQueryHandler>,
}

/// 构建应用上下文
///
/// # 参数
/// * `config` - 服务配置
pub async fn initialize(config: &QosConfig) -> Result<ApplicationContext> {
    // 1. PostgreSQL 连接池与表结构
    let store = PostgresQosStore::connect(&config.postgres_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store
        .init_schema()
        .await
        .context("Failed to initialize qos schema")?;

    // 2. Redis 连接（复用单个 ConnectionManager）
    let redis_client =
        redis::Client::open(config.redis_url.clone()).context("invalid redis url")?;
    let connection = ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    let connection = Arc::new(Mutex::new(connection));

    // 3. 存储端口
    let history: MetricsHistoryStoreRef = Arc::new(store.clone());
    let reports: ReportStoreRef = Arc::new(store.clone());
    let alerts: AlertStoreRef = Arc::new(store);

    // 4. 缓存与事件频道
    let realtime_cache: RealtimeMetricsCacheRef = Arc::new(RedisRealtimeCache::new(
        connection.clone(),
        config.namespace.clone(),
    ));
    let aggregate_cache: AggregateCacheRef = Arc::new(RedisAggregateCache::new(
        connection.clone(),
        config.namespace.clone(),
    ));
    let channel: RealtimeChannelRef = Arc::new(RedisRealtimeChannel::new(
        connection,
        config.namespace.clone(),
    ));

    // 5. 外部协作方（均为可选配置）
    let notifier: NotificationSenderRef = match &config.notification_base_url {
        Some(base_url) => {
            info!(base_url = %base_url, "notification sender enabled");
            Arc::new(HttpNotificationSender::new(
                base_url.clone(),
                config.collaborator_timeout,
            )?)
        }
        None => {
            warn!("QOS_NOTIFICATION_BASE_URL not configured, notifications are no-op");
            Arc::new(NoopNotificationSender)
        }
    };
    let sessions: Option<SessionDirectoryRef> = match &config.signaling_base_url {
        Some(base_url) => Some(Arc::new(HttpSessionDirectory::new(
            base_url.clone(),
            config.collaborator_timeout,
        )?)),
        None => {
            info!("QOS_SIGNALING_BASE_URL not configured, session lookup disabled");
            None
        }
    };

    // 6. 领域服务
    let pipeline = Arc::new(QosDomainService::new(
        history.clone(),
        realtime_cache.clone(),
        alerts,
        channel,
        notifier,
        sessions.clone(),
        QosPipelineConfig {
            realtime_ttl: config.realtime_ttl,
            alert_dedup_window: config.alert_dedup_window,
        },
    ));
    let report_service = Arc::new(ReportDomainService::new(
        history,
        reports,
        realtime_cache,
        aggregate_cache,
        sessions,
        config.aggregate_ttl,
    ));

    // 7. 应用层处理器
    let command_handler = Arc::new(QosCommandHandler::new(
        pipeline.clone(),
        report_service.clone(),
    ));
    let query_handler = Arc::new(QosQueryHandler::new(pipeline, report_service));

    Ok(ApplicationContext {
        command_handler,
        query_handler,
    })
}
