//! API layer - HTTP handlers and routing
//!
//! Thin adapter over the services: request bodies are decoded into
//! typed commands, service results are serialized into the JSON
//! envelopes clients expect (`{"post_id": ...}`, `{"user_id": ...}`,
//! `{"status": "OK"}`, `{"error": ...}`).

pub mod middleware;
pub mod posts;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState};

/// Build the API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", post(posts::list_posts))
        .route("/api/posts/new", post(posts::create_post))
        .route("/api/posts/bytitle", post(posts::search_posts))
        .route("/api/posts/raw/{id}", get(posts::get_raw_post))
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/users", post(users::list_users))
        .route("/api/users/new", post(users::register))
        .route("/api/users/delete", delete(users::delete_user))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    build_api_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
