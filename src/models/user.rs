//! User model
//!
//! Defines the User entity and its role enum. Users own posts; the
//! privileged role unlocks the listing/search endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A registered user.
///
/// The id is an opaque short string generated at creation and never
/// exposed to clients (see `services::privacy`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique opaque identifier
    pub id: String,
    /// Username (unique)
    pub username: String,
    /// Email address (unique, used as the login identifier)
    pub email: String,
    /// Password hash (argon2), never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password`.
    pub fn new(id: String, username: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            role: UserRole::Unprivileged,
            created_at: Utc::now(),
        }
    }

    /// Check whether the user may list/search all posts and users
    pub fn is_privileged(&self) -> bool {
        self.role == UserRole::Privileged
    }
}

/// User role for authorization.
///
/// Privileged users can list and search all posts; everyone else is
/// limited to public reads and their own posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Can list/search all posts and users
    Privileged,
    /// Regular user (default)
    #[default]
    Unprivileged,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Privileged => write!(f, "privileged"),
            UserRole::Unprivileged => write!(f, "unprivileged"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "privileged" => Ok(UserRole::Privileged),
            "unprivileged" => Ok(UserRole::Unprivileged),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Client-facing view of a user.
///
/// The id is optional so the privacy filter can null it out before the
/// value leaves the service layer; the password hash is not carried at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Internal identifier, nulled by the privacy filter
    pub id: Option<String>,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// User role
    pub role: UserRole,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: Some(user.id),
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_defaults_to_unprivileged() {
        let user = User::new(
            "a1b2c3".to_string(),
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hashed".to_string(),
        );

        assert_eq!(user.role, UserRole::Unprivileged);
        assert!(!user.is_privileged());
    }

    #[test]
    fn test_privileged_check() {
        let mut user = User::new(
            "a1b2c3".to_string(),
            "admin".to_string(),
            "admin@example.com".to_string(),
            "hashed".to_string(),
        );
        user.role = UserRole::Privileged;

        assert!(user.is_privileged());
    }

    #[test]
    fn test_role_display_roundtrip() {
        for role in [UserRole::Privileged, UserRole::Unprivileged] {
            let parsed = UserRole::from_str(&role.to_string()).unwrap();
            assert_eq!(parsed, role);
        }
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn test_summary_keeps_id_and_drops_hash() {
        let user = User::new(
            "a1b2c3".to_string(),
            "testuser".to_string(),
            "test@example.com".to_string(),
            "hashed".to_string(),
        );

        let summary = UserSummary::from(user);
        assert_eq!(summary.id.as_deref(), Some("a1b2c3"));
        assert_eq!(summary.username, "testuser");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "a1b2c3".to_string(),
            "testuser".to_string(),
            "test@example.com".to_string(),
            "secret-hash".to_string(),
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
