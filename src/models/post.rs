//! Post model
//!
//! A post is a short-lived piece of text, optionally owned by a user.
//! Posts without an owner are anonymous and can never be changed or
//! deleted through the API.
//!
//! Expiration is day-granular: a post is active while its expiration date
//! is strictly in the future, so the date itself is the first day the
//! post is no longer readable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserSummary;

/// A text post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique opaque identifier
    pub id: String,
    /// Post title
    pub title: String,
    /// Post body
    pub content: String,
    /// Creation date
    pub created_at: NaiveDate,
    /// Expiration date; `None` means the post never expires
    pub expiration_date: Option<NaiveDate>,
    /// Owner, if the post was created with credentials
    #[serde(rename = "user")]
    pub owner: Option<UserSummary>,
}

impl Post {
    /// Whether the post is still readable on the given day.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.expiration_date.map_or(true, |date| date > today)
    }

    /// Whether the post is anonymous (has no owner).
    pub fn is_anonymous(&self) -> bool {
        self.owner.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn sample_post(expiration_date: Option<NaiveDate>) -> Post {
        Post {
            id: "abc123".to_string(),
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiration_date,
            owner: None,
        }
    }

    #[test]
    fn test_post_without_expiration_is_active() {
        let post = sample_post(None);
        let today = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
        assert!(post.is_active(today));
    }

    #[test]
    fn test_post_expiring_today_is_inactive() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let post = sample_post(Some(today));
        assert!(!post.is_active(today));
    }

    #[test]
    fn test_post_expiring_tomorrow_is_active() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let post = sample_post(Some(today.checked_add_days(Days::new(1)).unwrap()));
        assert!(post.is_active(today));
    }

    #[test]
    fn test_post_expired_yesterday_is_inactive() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let post = sample_post(Some(today.checked_sub_days(Days::new(1)).unwrap()));
        assert!(!post.is_active(today));
    }

    #[test]
    fn test_anonymous_check() {
        let post = sample_post(None);
        assert!(post.is_anonymous());
    }

    #[test]
    fn test_serializes_owner_as_user_field() {
        let mut post = sample_post(None);
        post.owner = Some(UserSummary {
            id: None,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: crate::models::UserRole::Unprivileged,
        });

        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("user").is_some());
        assert!(json.get("owner").is_none());
        assert_eq!(json["user"]["id"], serde_json::Value::Null);
    }
}
