use account_service::config::AccountConfig;
use account_service::services::init_metrics;
use account_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    let config = AccountConfig::load()
        .map_err(|e| std::io::Error::other(format!("Configuration error: {}", e)))?;

    init_tracing(
        "account-service",
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        store = ?config.store,
        version = %config.service_version,
        "Starting account-service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
