//! Application startup and lifecycle management.

use crate::config::{AccountConfig, StoreBackend};
use crate::handlers;
use crate::services::{AccountRepository, Database, InMemoryAccountRepository};
use axum::{middleware, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    cors_layer, metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AccountConfig,
    pub repository: Arc<dyn AccountRepository>,
}

impl AppState {
    pub fn new(config: AccountConfig, repository: Arc<dyn AccountRepository>) -> Self {
        Self { config, repository }
    }
}

/// All HTTP routes with the service middleware stack.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route(
            "/accounts/:account_id",
            get(handlers::read_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Open the store named by the configuration.
pub async fn connect_repository(
    config: &AccountConfig,
) -> Result<Arc<dyn AccountRepository>, AppError> {
    match config.store {
        StoreBackend::Postgres => {
            let settings = config.database.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("PostgreSQL store selected without DATABASE_URL"))
            })?;

            let db = Database::new(
                &settings.url,
                settings.max_connections,
                settings.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to PostgreSQL: {}", e);
                e
            })?;
            db.run_migrations().await.map_err(|e| {
                tracing::error!("Failed to run database migrations: {}", e);
                e
            })?;

            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory account store; records are lost on shutdown");
            Ok(Arc::new(InMemoryAccountRepository::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: AccountConfig) -> Result<Self, AppError> {
        let repository = connect_repository(&config).await?;
        Self::build_with_repository(config, repository).await
    }

    /// Bind the listener and assemble the server around an already opened store.
    pub async fn build_with_repository(
        config: AccountConfig,
        repository: Arc<dyn AccountRepository>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(config.clone(), repository);
        let app = build_router(state.clone());

        let addr = config.common.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn repository(&self) -> Arc<dyn AccountRepository> {
        self.state.repository.clone()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
