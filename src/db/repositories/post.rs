//! Post repository
//!
//! Storage port for posts. Reads join the owner row so the service layer
//! gets the owner identity in one round trip; mutations are owner-guarded
//! single statements (`WHERE id = ? AND user_id = ?`) returning affected
//! row counts, which closes the check-then-mutate race without an
//! explicit transaction.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Post, UserRole, UserSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new post
    async fn insert(&self, post: &Post) -> Result<()>;

    /// Find a post by id, including its owner if any
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>>;

    /// Find posts whose title contains the given fragment (case-sensitive)
    async fn find_by_title(&self, fragment: &str) -> Result<Vec<Post>>;

    /// List all posts
    async fn list(&self) -> Result<Vec<Post>>;

    /// Overwrite title and content of a post owned by `owner_id`.
    ///
    /// Returns the number of rows touched; 0 means the post vanished or
    /// changed hands between the ownership check and the write.
    async fn update_owned(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        content: &str,
    ) -> Result<u64>;

    /// Delete a post owned by `owner_id`, returning the affected row count.
    async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<u64>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn insert(&self, post: &Post) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_post_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => insert_post_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_post_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => find_post_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn find_by_title(&self, fragment: &str) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_posts_by_title_sqlite(self.pool.as_sqlite().unwrap(), fragment).await
            }
            DatabaseDriver::Mysql => {
                find_posts_by_title_mysql(self.pool.as_mysql().unwrap(), fragment).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_posts_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_posts_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update_owned(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        content: &str,
    ) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_owned_sqlite(self.pool.as_sqlite().unwrap(), id, owner_id, title, content)
                    .await
            }
            DatabaseDriver::Mysql => {
                update_owned_mysql(self.pool.as_mysql().unwrap(), id, owner_id, title, content)
                    .await
            }
        }
    }

    async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_owned_sqlite(self.pool.as_sqlite().unwrap(), id, owner_id).await
            }
            DatabaseDriver::Mysql => {
                delete_owned_mysql(self.pool.as_mysql().unwrap(), id, owner_id).await
            }
        }
    }
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.created_at, p.expiration_date,
           u.id AS owner_id, u.username AS owner_username,
           u.email AS owner_email, u.role AS owner_role
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<()> {
    let owner_id = post.owner.as_ref().and_then(|o| o.id.as_deref());

    sqlx::query(
        r#"
        INSERT INTO posts (id, title, content, created_at, expiration_date, user_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.created_at)
    .bind(post.expiration_date)
    .bind(owner_id)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(())
}

async fn find_post_by_id_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Post>> {
    let query = format!("{} WHERE p.id = ?", POST_SELECT);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to find post by id")?;

    row.map(|row| row_to_post_sqlite(&row)).transpose()
}

async fn find_posts_by_title_sqlite(pool: &SqlitePool, fragment: &str) -> Result<Vec<Post>> {
    // instr() keeps the match case-sensitive, unlike LIKE
    let query = format!("{} WHERE instr(p.title, ?) > 0 ORDER BY p.created_at", POST_SELECT);
    let rows = sqlx::query(&query)
        .bind(fragment)
        .fetch_all(pool)
        .await
        .context("Failed to find posts by title")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn list_posts_sqlite(pool: &SqlitePool) -> Result<Vec<Post>> {
    let query = format!("{} ORDER BY p.created_at", POST_SELECT);
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn update_owned_sqlite(
    pool: &SqlitePool,
    id: &str,
    owner_id: &str,
    title: &str,
    content: &str,
) -> Result<u64> {
    let result = sqlx::query("UPDATE posts SET title = ?, content = ? WHERE id = ? AND user_id = ?")
        .bind(title)
        .bind(content)
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    Ok(result.rows_affected())
}

async fn delete_owned_sqlite(pool: &SqlitePool, id: &str, owner_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let owner_id: Option<String> = row.get("owner_id");
    let owner = match owner_id {
        Some(id) => {
            let role_str: String = row.get("owner_role");
            let role = UserRole::from_str(&role_str)
                .with_context(|| format!("Invalid role in database: {}", role_str))?;
            Some(UserSummary {
                id: Some(id),
                username: row.get("owner_username"),
                email: row.get("owner_email"),
                role,
            })
        }
        None => None,
    };

    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get::<NaiveDate, _>("created_at"),
        expiration_date: row.get::<Option<NaiveDate>, _>("expiration_date"),
        owner,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_post_mysql(pool: &MySqlPool, post: &Post) -> Result<()> {
    let owner_id = post.owner.as_ref().and_then(|o| o.id.as_deref());

    sqlx::query(
        r#"
        INSERT INTO posts (id, title, content, created_at, expiration_date, user_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.created_at)
    .bind(post.expiration_date)
    .bind(owner_id)
    .execute(pool)
    .await
    .context("Failed to insert post")?;

    Ok(())
}

async fn find_post_by_id_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Post>> {
    let query = format!("{} WHERE p.id = ?", POST_SELECT);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to find post by id")?;

    row.map(|row| row_to_post_mysql(&row)).transpose()
}

async fn find_posts_by_title_mysql(pool: &MySqlPool, fragment: &str) -> Result<Vec<Post>> {
    // BINARY forces a case-sensitive search regardless of column collation
    let query = format!(
        "{} WHERE INSTR(p.title, BINARY ?) > 0 ORDER BY p.created_at",
        POST_SELECT
    );
    let rows = sqlx::query(&query)
        .bind(fragment)
        .fetch_all(pool)
        .await
        .context("Failed to find posts by title")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn list_posts_mysql(pool: &MySqlPool) -> Result<Vec<Post>> {
    let query = format!("{} ORDER BY p.created_at", POST_SELECT);
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn update_owned_mysql(
    pool: &MySqlPool,
    id: &str,
    owner_id: &str,
    title: &str,
    content: &str,
) -> Result<u64> {
    let result = sqlx::query("UPDATE posts SET title = ?, content = ? WHERE id = ? AND user_id = ?")
        .bind(title)
        .bind(content)
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    Ok(result.rows_affected())
}

async fn delete_owned_mysql(pool: &MySqlPool, id: &str, owner_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected())
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    let owner_id: Option<String> = row.get("owner_id");
    let owner = match owner_id {
        Some(id) => {
            let role_str: String = row.get("owner_role");
            let role = UserRole::from_str(&role_str)
                .with_context(|| format!("Invalid role in database: {}", role_str))?;
            Some(UserSummary {
                id: Some(id),
                username: row.get("owner_username"),
                email: row.get("owner_email"),
                role,
            })
        }
        None => None,
    };

    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get::<NaiveDate, _>("created_at"),
        expiration_date: row.get::<Option<NaiveDate>, _>("expiration_date"),
        owner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use crate::services::password::hash_password;
    use chrono::{Days, Utc};

    async fn setup() -> (DynDatabasePool, SqlxPostRepository, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            pool.clone(),
            SqlxPostRepository::new(pool.clone()),
            SqlxUserRepository::new(pool),
        )
    }

    async fn insert_user(repo: &SqlxUserRepository, id: &str, username: &str) -> UserSummary {
        let user = User::new(
            id.to_string(),
            username.to_string(),
            format!("{}@example.com", username),
            hash_password("pw").expect("Failed to hash"),
        );
        repo.insert(&user).await.expect("Failed to insert user");
        UserSummary::from(user)
    }

    fn test_post(id: &str, title: &str, owner: Option<UserSummary>) -> Post {
        let today = Utc::now().date_naive();
        Post {
            id: id.to_string(),
            title: title.to_string(),
            content: "content".to_string(),
            created_at: today,
            expiration_date: Some(today.checked_add_days(Days::new(7)).unwrap()),
            owner,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_anonymous_post() {
        let (_pool, posts, _users) = setup().await;

        posts
            .insert(&test_post("p1", "hello", None))
            .await
            .expect("Failed to insert post");

        let found = posts
            .find_by_id("p1")
            .await
            .expect("Failed to find post")
            .expect("Post not found");

        assert_eq!(found.title, "hello");
        assert!(found.owner.is_none());
    }

    #[tokio::test]
    async fn test_insert_and_find_owned_post() {
        let (_pool, posts, users) = setup().await;
        let owner = insert_user(&users, "u1", "alice").await;

        posts
            .insert(&test_post("p1", "owned", Some(owner)))
            .await
            .expect("Failed to insert post");

        let found = posts
            .find_by_id("p1")
            .await
            .expect("Failed to find post")
            .expect("Post not found");

        let owner = found.owner.expect("Owner should be joined");
        assert_eq!(owner.id.as_deref(), Some("u1"));
        assert_eq!(owner.username, "alice");
    }

    #[tokio::test]
    async fn test_find_by_title_substring() {
        let (_pool, posts, _users) = setup().await;
        posts.insert(&test_post("p1", "rust notes", None)).await.unwrap();
        posts.insert(&test_post("p2", "shopping list", None)).await.unwrap();
        posts.insert(&test_post("p3", "more rust", None)).await.unwrap();

        let found = posts.find_by_title("rust").await.expect("Search failed");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_title_is_case_sensitive() {
        let (_pool, posts, _users) = setup().await;
        posts.insert(&test_post("p1", "Rust notes", None)).await.unwrap();

        let lower = posts.find_by_title("rust").await.expect("Search failed");
        assert!(lower.is_empty());

        let upper = posts.find_by_title("Rust").await.expect("Search failed");
        assert_eq!(upper.len(), 1);
    }

    #[tokio::test]
    async fn test_update_owned_touches_one_row() {
        let (_pool, posts, users) = setup().await;
        let owner = insert_user(&users, "u1", "alice").await;
        posts.insert(&test_post("p1", "before", Some(owner))).await.unwrap();

        let touched = posts
            .update_owned("p1", "u1", "after", "new content")
            .await
            .expect("Update failed");
        assert_eq!(touched, 1);

        let found = posts.find_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.title, "after");
        assert_eq!(found.content, "new content");
    }

    #[tokio::test]
    async fn test_update_owned_wrong_owner_touches_nothing() {
        let (_pool, posts, users) = setup().await;
        let owner = insert_user(&users, "u1", "alice").await;
        insert_user(&users, "u2", "bob").await;
        posts.insert(&test_post("p1", "title", Some(owner))).await.unwrap();

        let touched = posts
            .update_owned("p1", "u2", "hijacked", "oops")
            .await
            .expect("Update failed");
        assert_eq!(touched, 0);

        let found = posts.find_by_id("p1").await.unwrap().unwrap();
        assert_eq!(found.title, "title");
    }

    #[tokio::test]
    async fn test_delete_owned() {
        let (_pool, posts, users) = setup().await;
        let owner = insert_user(&users, "u1", "alice").await;
        posts.insert(&test_post("p1", "title", Some(owner))).await.unwrap();

        let removed = posts.delete_owned("p1", "u1").await.expect("Delete failed");
        assert_eq!(removed, 1);
        assert!(posts.find_by_id("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_posts() {
        let (_pool, posts, users) = setup().await;
        let owner = insert_user(&users, "u1", "alice").await;
        posts.insert(&test_post("p1", "title", Some(owner))).await.unwrap();
        posts.insert(&test_post("p2", "anon", None)).await.unwrap();

        let removed = users
            .delete_by_email("alice@example.com")
            .await
            .expect("Failed to delete user");
        assert_eq!(removed, 1);

        // Owned post goes with the user; the anonymous one stays
        assert!(posts.find_by_id("p1").await.unwrap().is_none());
        assert!(posts.find_by_id("p2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_post_without_expiration_roundtrips() {
        let (_pool, posts, _users) = setup().await;
        let mut post = test_post("p1", "eternal", None);
        post.expiration_date = None;
        posts.insert(&post).await.unwrap();

        let found = posts.find_by_id("p1").await.unwrap().unwrap();
        assert!(found.expiration_date.is_none());
    }
}
