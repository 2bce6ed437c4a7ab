use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "OK" })))
}

/// Root URL response.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "name": state.config.service_name,
            "version": state.config.service_version,
        })),
    )
}

/// Ready once the store answers.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state.repository.health_check().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::ServiceUnavailable
    })?;

    tracing::debug!("Readiness check passed");
    Ok((StatusCode::OK, Json(json!({ "status": "ready" }))))
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
