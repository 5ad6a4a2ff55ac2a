//! 信令协作方的会话查找客户端（只读）

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

use crate::domain::model::CallSessionSummary;
use crate::domain::repository::SessionDirectory;

pub struct HttpSessionDirectory {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build session directory http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SessionDirectory for HttpSessionDirectory {
    async fn get_session(&self, session_id: &str) -> Result<Option<CallSessionSummary>> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("session lookup request")?;

        // 未知会话是显式的空结果，不是错误
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow!("signaling service returned {}", response.status()));
        }

        let summary = response
            .json::<CallSessionSummary>()
            .await
            .context("decode session summary")?;
        Ok(Some(summary))
    }
}
