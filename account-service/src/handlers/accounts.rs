use crate::models::{Account, DataValidationError};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics::counter;
use serde_json::Value;
use service_core::error::AppError;

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Creates an Account from the JSON body.
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Request to create an Account");
    check_content_type(&headers, JSON_MEDIA_TYPE)?;

    let mut account = Account::default();
    account.deserialize(&parse_body(&body)?)?;

    let account = state.repository.create(&account).await?;
    let id = account.id.ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("store returned an Account without an id"))
    })?;
    counter!("accounts_created_total").increment(1);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location_for(&headers, id))],
        Json(account.serialize()),
    ))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Request to list Accounts");
    let accounts = state.repository.all().await?;

    Ok(Json(Value::Array(
        accounts.iter().map(Account::serialize).collect(),
    )))
}

pub async fn read_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(account_id = %account_id, "Request to read an Account");
    let account = find_account(&state, &account_id).await?;

    Ok(Json(account.serialize()))
}

/// Replaces the mutable fields of an existing Account.
///
/// The lookup runs before the Content-Type check, so an unknown id is a 404
/// whatever the request carries.
pub async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(account_id = %account_id, "Request to update an Account");
    let mut account = find_account(&state, &account_id).await?;
    check_content_type(&headers, JSON_MEDIA_TYPE)?;

    account.deserialize(&parse_body(&body)?)?;
    let account = state.repository.update(&account).await?;

    Ok(Json(account.serialize()))
}

/// Deleting an absent Account is not an error.
pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(account_id = %account_id, "Request to delete an Account");
    if let Some(id) = parse_account_id(&account_id) {
        if state.repository.delete(id).await? {
            counter!("accounts_deleted_total").increment(1);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Rejects the request unless `Content-Type` is exactly `media_type`.
pub fn check_content_type(headers: &HeaderMap, media_type: &str) -> Result<(), AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    if content_type == Some(media_type) {
        return Ok(());
    }

    tracing::error!(content_type = ?content_type, "Invalid Content-Type");
    Err(AppError::UnsupportedMediaType(format!(
        "Content-Type must be {}",
        media_type
    )))
}

fn parse_body(body: &Bytes) -> Result<Value, DataValidationError> {
    serde_json::from_slice(body).map_err(|e| {
        DataValidationError::new(format!("body of request contained bad or no data ({})", e))
    })
}

/// Ids that are not integers name no Account.
fn parse_account_id(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

async fn find_account(state: &AppState, account_id: &str) -> Result<Account, AppError> {
    let not_found = || {
        AppError::NotFound(anyhow::anyhow!(
            "Account with id [{}] could not be found.",
            account_id
        ))
    };

    let id = parse_account_id(account_id).ok_or_else(not_found)?;
    state.repository.find(id).await?.ok_or_else(not_found)
}

/// Absolute URL of the read endpoint when the request names its host,
/// otherwise a path.
fn location_for(headers: &HeaderMap, id: i32) -> String {
    let path = format!("/accounts/{}", id);
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http");
            format!("{}://{}{}", scheme, host, path)
        }
        None => path,
    }
}
