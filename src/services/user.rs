//! User service
//!
//! Business rules for accounts: registration (with duplicate-identity
//! checks and the injected registration kill-switch), credential
//! verification, the privileged-role check used by the listing endpoints,
//! and credential-gated self-deletion.
//!
//! Every operation returns a structured error from the taxonomy below;
//! unexpected store or hasher failures surface as `Internal`.

use crate::db::repositories::UserRepository;
use crate::models::{User, UserSummary};
use crate::services::idgen::IdGenerator;
use crate::services::password::{hash_password, verify_password};
use crate::services::privacy;
use anyhow::Context;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// No user with the given email
    #[error("Cannot find user")]
    NotFound,

    /// Password does not verify against the stored hash
    #[error("Wrong email or password")]
    WrongCredentials,

    /// Email or username already registered
    #[error("Email or username already taken")]
    DuplicateIdentity,

    /// Valid credentials but insufficient role (or bad login) for a
    /// privileged operation
    #[error("Wrong credentials or insufficient privileges")]
    Unauthorized,

    /// Registration has been switched off
    #[error("Registration is disabled")]
    RegistrationDisabled,

    /// The delete statement touched an unexpected number of rows
    #[error("Error while deleting user")]
    DeletionFailed,

    /// Unexpected store/hasher fault
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Login credentials presented with a request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// User service for registration and authorization
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    id_gen: Arc<dyn IdGenerator>,
    registration_disabled: bool,
}

impl UserService {
    /// Create a new user service.
    ///
    /// `registration_disabled` is injected here rather than read from the
    /// environment so the flag is testable and visible at wiring time.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        id_gen: Arc<dyn IdGenerator>,
        registration_disabled: bool,
    ) -> Self {
        Self {
            user_repo,
            id_gen,
            registration_disabled,
        }
    }

    /// Register a new user and return the generated id.
    ///
    /// # Errors
    ///
    /// - `RegistrationDisabled` when the kill-switch is on
    /// - `DuplicateIdentity` when the email or username is taken
    pub async fn register(&self, input: RegisterInput) -> Result<String, UserServiceError> {
        if self.registration_disabled {
            return Err(UserServiceError::RegistrationDisabled);
        }

        let by_email = self
            .user_repo
            .find_by_email(&input.email)
            .await
            .context("Failed to check email")?;
        let by_username = self
            .user_repo
            .find_by_username(&input.username)
            .await
            .context("Failed to check username")?;

        if by_email.is_some() || by_username.is_some() {
            return Err(UserServiceError::DuplicateIdentity);
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        // Role is always unprivileged at creation; promotion happens out of band
        let user = User::new(
            self.id_gen.generate(),
            input.username,
            input.email,
            password_hash,
        );

        self.user_repo
            .insert(&user)
            .await
            .context("Failed to insert user")?;

        tracing::info!(username = %user.username, "registered new user");

        Ok(user.id)
    }

    /// Verify credentials and return the matching user.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no user has the given email
    /// - `WrongCredentials` when the password does not verify
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .find_by_email(&credentials.email)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::NotFound)?;

        let valid = verify_password(&credentials.password, &user.password_hash)
            .context("Failed to verify password")?;

        if !valid {
            return Err(UserServiceError::WrongCredentials);
        }

        Ok(user)
    }

    /// Check whether the credentials belong to a privileged user.
    ///
    /// Authentication failures collapse to `false`; only unexpected store
    /// faults propagate as errors.
    pub async fn is_privileged(&self, credentials: &Credentials) -> Result<bool, UserServiceError> {
        match self.authenticate(credentials).await {
            Ok(user) => Ok(user.is_privileged()),
            Err(UserServiceError::NotFound) | Err(UserServiceError::WrongCredentials) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List all users, privileged callers only.
    ///
    /// Results pass through the privacy filter.
    pub async fn list_users(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<UserSummary>, UserServiceError> {
        if !self.is_privileged(credentials).await? {
            return Err(UserServiceError::Unauthorized);
        }

        let users = self.user_repo.list().await.context("Failed to list users")?;

        Ok(users
            .into_iter()
            .map(|u| privacy::scrub_user(UserSummary::from(u)))
            .collect())
    }

    /// Delete the account matching the credentials.
    ///
    /// Owned posts are removed along with the account (store cascade).
    ///
    /// # Errors
    ///
    /// - `NotFound` / `WrongCredentials` on bad credentials
    /// - `DeletionFailed` when the delete touched ≠ 1 rows
    pub async fn delete_user(&self, credentials: &Credentials) -> Result<(), UserServiceError> {
        self.authenticate(credentials).await?;

        let removed = self
            .user_repo
            .delete_by_email(&credentials.email)
            .await
            .context("Failed to delete user")?;

        if removed != 1 {
            tracing::warn!(rows = removed, "user deletion touched an unexpected row count");
            return Err(UserServiceError::DeletionFailed);
        }

        tracing::info!(email = %credentials.email, "deleted user");

        Ok(())
    }
}
