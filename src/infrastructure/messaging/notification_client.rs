//! 通知协作方的 HTTP 客户端
//!
//! push/email/in-app 的实际投递由统一通知服务完成，这里只是下发请求。
//! 未配置通知服务时退化为 no-op 实现，整条告警链路照常工作。

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::repository::{NotificationRequest, NotificationSender};

pub struct HttpNotificationSender {
    base_url: String,
    client: reqwest::Client,
}

impl HttpNotificationSender {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build notification http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl NotificationSender for HttpNotificationSender {
    async fn create_notification(&self, request: &NotificationRequest) -> Result<()> {
        let url = format!("{}/notifications", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("send notification request")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "notification service returned {}",
                response.status()
            ));
        }
        Ok(())
    }

    async fn create_from_template(
        &self,
        template: &str,
        recipient: &str,
        data: Value,
    ) -> Result<()> {
        let url = format!("{}/notifications/from-template", self.base_url);
        let body = json!({
            "template": template,
            "recipient": recipient,
            "data": data,
        });
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("send templated notification request")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "notification service returned {}",
                response.status()
            ));
        }
        Ok(())
    }
}

/// 未配置通知服务时的空实现
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn create_notification(&self, request: &NotificationRequest) -> Result<()> {
        debug!(
            user_id = %request.user_id,
            title = %request.title,
            "notification service not configured, dropping notification"
        );
        Ok(())
    }

    async fn create_from_template(
        &self,
        template: &str,
        recipient: &str,
        _data: Value,
    ) -> Result<()> {
        debug!(
            template = template,
            recipient = recipient,
            "notification service not configured, dropping templated notification"
        );
        Ok(())
    }
}
