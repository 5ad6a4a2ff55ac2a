use qos_monitor::service::QosServiceApp;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app = QosServiceApp::new().await?;

    info!(
        address = %app.address(),
        "Starting qos-monitor service"
    );

    app.run().await
}
