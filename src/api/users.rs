//! User API endpoints
//!
//! - POST   /api/users        - list all users (privileged)
//! - POST   /api/users/new    - register a new user
//! - DELETE /api/users/delete - authenticated self-deletion

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState};
use crate::api::posts::CredentialsBody;
use crate::models::UserSummary;
use crate::services::user::RegisterInput;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn require_field(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::validation(
            field,
            format!("{field} cannot be empty"),
        )),
    }
}

/// POST /api/users - list all users, privileged callers only
pub async fn list_users(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let credentials = body.into_credentials()?;
    let users = state.user_service.list_users(&credentials).await?;
    Ok(Json(users))
}

/// POST /api/users/new - register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, ApiError> {
    let username = require_field(body.username, "username")?;
    let email = require_field(body.email, "email")?;
    let password = require_field(body.password, "password")?;

    let id = state
        .user_service
        .register(RegisterInput::new(username, email, password))
        .await?;

    Ok(Json(json!({ "user_id": id })))
}

/// DELETE /api/users/delete - delete the account matching the credentials
pub async fn delete_user(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let credentials = body.into_credentials()?;
    state.user_service.delete_user(&credentials).await?;
    Ok(Json(json!({ "status": "OK" })))
}
