//! Privacy filter
//!
//! Strips internal identifiers from anything that leaves the service
//! layer: a client must never learn a user's id (it doubles as the
//! ownership key) and password hashes never leave the repository in
//! client-facing shapes at all. Both functions are pure and idempotent.

use crate::models::{Post, UserSummary};

/// Null out a user's internal id.
pub fn scrub_user(mut user: UserSummary) -> UserSummary {
    user.id = None;
    user
}

/// Null out the owner id embedded in a post, if the post has an owner.
pub fn scrub_post(mut post: Post) -> Post {
    post.owner = post.owner.map(scrub_user);
    post
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::NaiveDate;

    fn summary() -> UserSummary {
        UserSummary {
            id: Some("u1".to_string()),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::Unprivileged,
        }
    }

    fn owned_post() -> Post {
        Post {
            id: "p1".to_string(),
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiration_date: None,
            owner: Some(summary()),
        }
    }

    #[test]
    fn test_scrub_user_nulls_id() {
        let scrubbed = scrub_user(summary());
        assert!(scrubbed.id.is_none());
        assert_eq!(scrubbed.username, "alice");
        assert_eq!(scrubbed.email, "alice@example.com");
    }

    #[test]
    fn test_scrub_post_nulls_owner_id() {
        let scrubbed = scrub_post(owned_post());
        let owner = scrubbed.owner.expect("Owner should survive scrubbing");
        assert!(owner.id.is_none());
        assert_eq!(owner.username, "alice");
    }

    #[test]
    fn test_scrub_anonymous_post_is_untouched() {
        let mut post = owned_post();
        post.owner = None;

        let scrubbed = scrub_post(post.clone());
        assert_eq!(scrubbed.id, post.id);
        assert!(scrubbed.owner.is_none());
    }

    #[test]
    fn test_scrub_is_idempotent() {
        let once = scrub_post(owned_post());
        let twice = scrub_post(once.clone());
        assert_eq!(once.owner, twice.owner);
        assert_eq!(once.id, twice.id);
    }
}
