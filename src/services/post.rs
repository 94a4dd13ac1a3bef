//! Post service
//!
//! Post lifecycle rules: creation (anonymous or owned) with the
//! expiration policy, public single-post reads, privileged listing and
//! title search, and ownership-gated update/delete.
//!
//! Expiration is day-granular and the expiration date is the last valid
//! day: a post is active while `expiration_date > today`.

use crate::db::repositories::PostRepository;
use crate::models::Post;
use crate::services::idgen::IdGenerator;
use crate::services::privacy;
use crate::services::user::{Credentials, UserService, UserServiceError};
use anyhow::Context;
use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// No post with the given id
    #[error("Cannot find post")]
    NotFound,

    /// Requester email does not resolve to a user
    #[error("Cannot find user")]
    UserNotFound,

    /// Password does not verify against the stored hash
    #[error("Wrong email or password")]
    WrongCredentials,

    /// Privileged operation attempted without the privileged role
    #[error("Wrong credentials or insufficient privileges")]
    Unauthorized,

    /// Mutation attempted on a post that has no owner
    #[error("Anonymous posts cannot be modified")]
    AnonymousImmutable,

    /// Authenticated requester is not the owner of the post
    #[error("You do not own this post")]
    Forbidden,

    /// Requested expiration date is more than a year after creation
    #[error("Expiration date cannot be more than a year away")]
    ExpirationTooFar,

    /// The post is past its expiration date
    #[error("This post has expired")]
    Expired,

    /// The update statement touched an unexpected number of rows
    #[error("Error while updating post")]
    UpdateFailed,

    /// The delete statement touched an unexpected number of rows
    #[error("Error while deleting post")]
    DeletionFailed,

    /// Unexpected store fault
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Input for post creation
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    /// Omitted means one week from creation
    pub expiration_date: Option<NaiveDate>,
    /// Omitted means the post is anonymous
    pub credentials: Option<Credentials>,
}

/// Post service for lifecycle and ownership rules
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    user_service: Arc<UserService>,
    id_gen: Arc<dyn IdGenerator>,
}

/// Days a post lives when no expiration is requested.
const DEFAULT_LIFETIME_DAYS: u64 = 7;

/// Longest allowed lifetime at creation.
const MAX_LIFETIME_DAYS: u64 = 365;

impl PostService {
    /// Create a new post service
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        user_service: Arc<UserService>,
        id_gen: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            post_repo,
            user_service,
            id_gen,
        }
    }

    /// List all active posts, privileged callers only.
    pub async fn list_posts(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Post>, PostServiceError> {
        self.require_privileged(credentials).await?;

        let today = Utc::now().date_naive();
        let posts = self
            .post_repo
            .list()
            .await
            .context("Failed to list posts")?;

        Ok(posts
            .into_iter()
            .filter(|p| p.is_active(today))
            .map(privacy::scrub_post)
            .collect())
    }

    /// Fetch a single post. Public, no credentials needed.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no post has the id
    /// - `Expired` when the post's expiration date is today or earlier
    pub async fn get_post_by_id(&self, id: &str) -> Result<Post, PostServiceError> {
        let post = self
            .post_repo
            .find_by_id(id)
            .await
            .context("Failed to look up post")?
            .ok_or(PostServiceError::NotFound)?;

        if !post.is_active(Utc::now().date_naive()) {
            return Err(PostServiceError::Expired);
        }

        Ok(privacy::scrub_post(post))
    }

    /// Search active posts by case-sensitive title substring, privileged
    /// callers only.
    pub async fn get_posts_by_title(
        &self,
        credentials: &Credentials,
        fragment: &str,
    ) -> Result<Vec<Post>, PostServiceError> {
        self.require_privileged(credentials).await?;

        let today = Utc::now().date_naive();
        let posts = self
            .post_repo
            .find_by_title(fragment)
            .await
            .context("Failed to search posts")?;

        Ok(posts
            .into_iter()
            .filter(|p| p.is_active(today))
            .map(privacy::scrub_post)
            .collect())
    }

    /// Create a post and return its generated id.
    ///
    /// With credentials the resolved user becomes the owner; without, the
    /// post is anonymous and permanently immutable. An omitted expiration
    /// defaults to one week out; more than a year out is rejected.
    pub async fn create_post(&self, input: CreatePostInput) -> Result<String, PostServiceError> {
        let owner = match &input.credentials {
            Some(credentials) => match self.user_service.authenticate(credentials).await {
                Ok(user) => Some(user),
                Err(UserServiceError::NotFound) | Err(UserServiceError::WrongCredentials) => {
                    return Err(PostServiceError::WrongCredentials);
                }
                Err(UserServiceError::Internal(e)) => return Err(PostServiceError::Internal(e)),
                Err(e) => {
                    return Err(PostServiceError::Internal(anyhow::anyhow!(e)));
                }
            },
            None => None,
        };

        let created_at = Utc::now().date_naive();
        let expiration_date = match input.expiration_date {
            Some(date) => date,
            None => created_at + Days::new(DEFAULT_LIFETIME_DAYS),
        };

        if expiration_date > created_at + Days::new(MAX_LIFETIME_DAYS) {
            return Err(PostServiceError::ExpirationTooFar);
        }

        let post = Post {
            id: self.id_gen.generate(),
            title: input.title,
            content: input.content,
            created_at,
            expiration_date: Some(expiration_date),
            owner: owner.map(|u| u.into()),
        };

        self.post_repo
            .insert(&post)
            .await
            .context("Failed to insert post")?;

        tracing::info!(post_id = %post.id, anonymous = post.is_anonymous(), "created post");

        Ok(post.id)
    }

    /// Overwrite title and content of an owned post.
    ///
    /// The checks run in a fixed order so callers get the most specific
    /// error: missing post, anonymous post, unknown requester, bad
    /// password, then non-owner.
    pub async fn update_post(
        &self,
        credentials: &Credentials,
        post_id: &str,
        new_title: &str,
        new_content: &str,
    ) -> Result<(), PostServiceError> {
        let requester = self.resolve_owner(credentials, post_id).await?;

        let touched = self
            .post_repo
            .update_owned(post_id, &requester, new_title, new_content)
            .await
            .context("Failed to update post")?;

        if touched != 1 {
            tracing::warn!(post_id, rows = touched, "post update touched an unexpected row count");
            return Err(PostServiceError::UpdateFailed);
        }

        Ok(())
    }

    /// Delete an owned post. Same check sequence as `update_post`.
    pub async fn delete_post(
        &self,
        credentials: &Credentials,
        post_id: &str,
    ) -> Result<(), PostServiceError> {
        let requester = self.resolve_owner(credentials, post_id).await?;

        let touched = self
            .post_repo
            .delete_owned(post_id, &requester)
            .await
            .context("Failed to delete post")?;

        if touched != 1 {
            tracing::warn!(post_id, rows = touched, "post deletion touched an unexpected row count");
            return Err(PostServiceError::DeletionFailed);
        }

        tracing::info!(post_id, "deleted post");

        Ok(())
    }

    /// Run the ownership-check sequence for a mutation and return the
    /// requester's user id.
    async fn resolve_owner(
        &self,
        credentials: &Credentials,
        post_id: &str,
    ) -> Result<String, PostServiceError> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await
            .context("Failed to look up post")?
            .ok_or(PostServiceError::NotFound)?;

        let owner = post
            .owner
            .as_ref()
            .ok_or(PostServiceError::AnonymousImmutable)?;

        let requester = match self.user_service.authenticate(credentials).await {
            Ok(user) => user,
            Err(UserServiceError::NotFound) => return Err(PostServiceError::UserNotFound),
            Err(UserServiceError::WrongCredentials) => {
                return Err(PostServiceError::WrongCredentials)
            }
            Err(UserServiceError::Internal(e)) => return Err(PostServiceError::Internal(e)),
            Err(e) => return Err(PostServiceError::Internal(anyhow::anyhow!(e))),
        };

        if owner.id.as_deref() != Some(requester.id.as_str()) {
            return Err(PostServiceError::Forbidden);
        }

        Ok(requester.id)
    }

    async fn require_privileged(&self, credentials: &Credentials) -> Result<(), PostServiceError> {
        let privileged = match self.user_service.is_privileged(credentials).await {
            Ok(privileged) => privileged,
            Err(UserServiceError::Internal(e)) => return Err(PostServiceError::Internal(e)),
            Err(e) => return Err(PostServiceError::Internal(anyhow::anyhow!(e))),
        };

        if !privileged {
            return Err(PostServiceError::Unauthorized);
        }

        Ok(())
    }
}
