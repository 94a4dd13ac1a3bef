//! API middleware
//!
//! Shared application state and the error type every handler returns.
//! Service errors carry the domain taxonomy; this module maps each kind
//! to an HTTP status and the wire shape `{"error": "<message>"}` (or
//! `{"<field>": "<message>"}` for request validation failures).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::services::post::{PostService, PostServiceError};
use crate::services::user::{UserService, UserServiceError};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
}

/// Error response for API errors
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    /// JSON key the message is emitted under; "error" except for
    /// validation failures, which are keyed by field name
    key: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            key: "error".to_string(),
            message: message.into(),
        }
    }

    /// A request-shape validation failure, keyed by the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            key: field.into(),
            message: message.into(),
        }
    }

    pub fn missing_credentials() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Specify both email and password")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ self.key: self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        let status = match &err {
            UserServiceError::NotFound => StatusCode::NOT_FOUND,
            UserServiceError::WrongCredentials | UserServiceError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            UserServiceError::DuplicateIdentity => StatusCode::CONFLICT,
            UserServiceError::RegistrationDisabled => StatusCode::FORBIDDEN,
            UserServiceError::DeletionFailed => StatusCode::INTERNAL_SERVER_ERROR,
            UserServiceError::Internal(e) => {
                tracing::error!(error = %e, "user service failure");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };

        Self::new(status, err.to_string())
    }
}

impl From<PostServiceError> for ApiError {
    fn from(err: PostServiceError) -> Self {
        let status = match &err {
            PostServiceError::NotFound | PostServiceError::UserNotFound => StatusCode::NOT_FOUND,
            PostServiceError::WrongCredentials | PostServiceError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            PostServiceError::AnonymousImmutable | PostServiceError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            PostServiceError::ExpirationTooFar => StatusCode::BAD_REQUEST,
            PostServiceError::Expired => StatusCode::GONE,
            PostServiceError::UpdateFailed | PostServiceError::DeletionFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PostServiceError::Internal(e) => {
                tracing::error!(error = %e, "post service failure");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };

        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_uses_error_key() {
        let err = ApiError::new(StatusCode::NOT_FOUND, "Cannot find post");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error_is_field_keyed() {
        let err = ApiError::validation("title", "title cannot be empty");
        assert_eq!(err.key, "title");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_expired_maps_to_gone() {
        let err: ApiError = PostServiceError::Expired.into();
        assert_eq!(err.status, StatusCode::GONE);
    }

    #[test]
    fn test_duplicate_identity_maps_to_conflict() {
        let err: ApiError = UserServiceError::DuplicateIdentity.into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }
}
