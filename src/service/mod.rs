use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::QosConfig;
use crate::interface::http;

pub mod wire;

pub struct QosServiceApp {
    address: SocketAddr,
    context: Arc<wire::ApplicationContext>,
}

impl QosServiceApp {
    pub async fn new() -> Result<Self> {
        let config = QosConfig::from_env()?;
        let context = Arc::new(wire::initialize(&config).await?);
        Ok(Self {
            address: config.listen_addr,
            context,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub async fn run(self) -> Result<()> {
        let app = http::router(self.context);
        let listener = tokio::net::TcpListener::bind(self.address)
            .await
            .with_context(|| format!("failed to bind {}", self.address))?;
        info!(address = %self.address, "qos http server listening");
        axum::serve(listener, app)
            .await
            .context("http server exited")
    }
}
