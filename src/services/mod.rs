//! Business logic services
//!
//! The only layer with actual rules: account lifecycle, post lifecycle,
//! credential verification, and the privacy filter applied to everything
//! leaving the service boundary. Services own trait-object repositories
//! so tests can run them against an in-memory store.

pub mod idgen;
pub mod password;
pub mod post;
pub mod privacy;
pub mod user;

pub use idgen::{IdGenerator, ShortUuidGenerator};
pub use post::{CreatePostInput, PostService, PostServiceError};
pub use user::{Credentials, RegisterInput, UserService, UserServiceError};
