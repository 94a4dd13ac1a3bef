//! Repository layer
//!
//! Storage ports consumed by the service layer, with sqlx-backed
//! implementations dispatching on the configured database driver.

mod post;
mod user;

pub use post::{PostRepository, SqlxPostRepository};
pub use user::{SqlxUserRepository, UserRepository};
