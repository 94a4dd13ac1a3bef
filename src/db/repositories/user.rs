//! User repository
//!
//! Storage port for user records and its sqlx implementation for SQLite
//! and MySQL. Ids come from the service layer (see `services::idgen`),
//! so inserts take a fully-formed `User`.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn insert(&self, user: &User) -> Result<()>;

    /// Find a user by id
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>>;

    /// Delete a user by email, returning the number of rows removed.
    ///
    /// Owned posts go with the user (FK cascade).
    async fn delete_by_email(&self, email: &str) -> Result<u64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => insert_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => find_user_sqlite(self.pool.as_sqlite().unwrap(), "id", id).await,
            DatabaseDriver::Mysql => find_user_mysql(self.pool.as_mysql().unwrap(), "id", id).await,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_user_sqlite(self.pool.as_sqlite().unwrap(), "email", email).await
            }
            DatabaseDriver::Mysql => {
                find_user_mysql(self.pool.as_mysql().unwrap(), "email", email).await
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_user_sqlite(self.pool.as_sqlite().unwrap(), "username", username).await
            }
            DatabaseDriver::Mysql => {
                find_user_mysql(self.pool.as_mysql().unwrap(), "username", username).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_users_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                delete_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_user_sqlite(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(user.created_at)
    .execute(pool)
    .await
    .context("Failed to insert user")?;

    Ok(())
}

async fn find_user_sqlite(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
    let row = sqlx::query(&query)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to find user by {}", column))?;

    row.map(|row| row_to_user(&row)).transpose()
}

async fn list_users_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let query = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user).collect()
}

async fn delete_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected())
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_user_mysql(pool: &MySqlPool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.to_string())
    .bind(user.created_at)
    .execute(pool)
    .await
    .context("Failed to insert user")?;

    Ok(())
}

async fn find_user_mysql(pool: &MySqlPool, column: &str, value: &str) -> Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
    let row = sqlx::query(&query)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to find user by {}", column))?;

    row.map(|row| row_to_user_mysql(&row)).transpose()
}

async fn list_users_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let query = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_mysql).collect()
}

async fn delete_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
    })
}
