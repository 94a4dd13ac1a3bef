//! Data models
//!
//! Entities and client-facing projections shared by the service and API
//! layers.

mod post;
mod user;

pub use post::Post;
pub use user::{User, UserRole, UserSummary};
