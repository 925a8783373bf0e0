use axum::http::Method;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppState;
use crate::middleware::auth_middleware::auth_context_middleware;
use crate::middleware::rate_limiter::rate_limit_middleware;

pub mod auth_route;
pub mod blog_route;
pub mod category_route;
pub mod comment_route;
pub mod newsletter_route;
pub mod tag_route;
pub mod user_route;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/auth", auth_route::auth_routes())
        .nest("/api/blogs", blog_route::blog_routes())
        .nest("/api/comments", comment_route::comment_routes())
        .nest("/api/categories", category_route::category_routes())
        .nest("/api/tags", tag_route::tag_routes())
        .nest("/api/newsletter", newsletter_route::newsletter_routes())
        .nest("/api/users", user_route::user_routes())
        // Health check
        .route("/api/health", axum::routing::get(|| async { "OK" }))
        // Every route gets an AuthContext; anonymous callers carry an empty one.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
        .layer(cors)
}
