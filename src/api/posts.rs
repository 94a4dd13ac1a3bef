//! Post API endpoints
//!
//! - POST   /api/posts          - list all active posts (privileged)
//! - GET    /api/posts/{id}     - get a post by id (public)
//! - GET    /api/posts/raw/{id} - get bare post content (public)
//! - POST   /api/posts/bytitle  - search posts by title (privileged)
//! - POST   /api/posts/new      - create a post (anonymous or owned)
//! - PUT    /api/posts/{id}     - update an owned post
//! - DELETE /api/posts/{id}     - delete an owned post

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Post;
use crate::services::post::CreatePostInput;
use crate::services::user::Credentials;

/// Credentials as they appear in request bodies. Both fields are
/// optional so a missing one can be reported as a validation error
/// instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialsBody {
    /// Require both fields, with the message clients key off.
    pub fn into_credentials(self) -> Result<Credentials, ApiError> {
        match (self.email, self.password) {
            (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
            _ => Err(ApiError::missing_credentials()),
        }
    }
}

/// Request body for post creation, update, and title search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub user: Option<CredentialsBody>,
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

fn require_credentials(user: Option<CredentialsBody>) -> Result<Credentials, ApiError> {
    user.ok_or_else(ApiError::missing_credentials)?
        .into_credentials()
}

/// POST /api/posts - list all active posts, privileged callers only
pub async fn list_posts(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let credentials = body.into_credentials()?;
    let posts = state.post_service.list_posts(&credentials).await?;
    Ok(Json(posts))
}

/// GET /api/posts/{id} - public read of a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let post = state.post_service.get_post_by_id(&id).await?;
    Ok(Json(post))
}

/// GET /api/posts/raw/{id} - bare post content.
///
/// Browsers (Accept: text/html) get the content with angle brackets
/// escaped and wrapped in a pre block; everything else gets it verbatim.
pub async fn get_raw_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let post = state.post_service.get_post_by_id(&id).await?;

    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    let response = if wants_html {
        let escaped = post.content.replace('<', "&lt;").replace('>', "&gt;");
        (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            format!("<pre>{escaped}</pre>"),
        )
            .into_response()
    } else {
        post.content.into_response()
    };

    Ok(response)
}

/// POST /api/posts/bytitle - title-substring search, privileged callers
/// only. An omitted title matches every post.
pub async fn search_posts(
    State(state): State<AppState>,
    Json(body): Json<PostBody>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let credentials = require_credentials(body.user)?;
    let fragment = body.title.unwrap_or_default();
    let posts = state
        .post_service
        .get_posts_by_title(&credentials, &fragment)
        .await?;
    Ok(Json(posts))
}

/// POST /api/posts/new - create a post, anonymous or owned
pub async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<PostBody>,
) -> Result<Json<Value>, ApiError> {
    let title = require_field(body.title, "title")?;
    let content = require_field(body.content, "content")?;
    let credentials = match body.user {
        Some(user) => Some(user.into_credentials()?),
        None => None,
    };

    let id = state
        .post_service
        .create_post(CreatePostInput {
            title,
            content,
            expiration_date: body.expiration_date,
            credentials,
        })
        .await?;

    Ok(Json(json!({ "post_id": id })))
}

/// PUT /api/posts/{id} - ownership-gated update
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PostBody>,
) -> Result<Json<Value>, ApiError> {
    let credentials = require_credentials(body.user)?;
    let title = require_field(body.title, "title")?;
    let content = require_field(body.content, "content")?;

    state
        .post_service
        .update_post(&credentials, &id, &title, &content)
        .await?;

    Ok(Json(json!({ "status": "OK" })))
}

/// DELETE /api/posts/{id} - ownership-gated delete
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>, ApiError> {
    let credentials = body.into_credentials()?;
    state.post_service.delete_post(&credentials, &id).await?;
    Ok(Json(json!({ "status": "OK" })))
}
