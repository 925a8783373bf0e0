use axum::{
    routing::{get, patch},
    Router,
};

use crate::config::AppState;
use crate::handlers::blog_handler::*;
use crate::handlers::comment_handler::{create_comment_handler, list_blog_comments_handler};

pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blogs_handler).post(create_blog_handler))
        .route("/featured", get(featured_blogs_handler))
        .route("/stats", get(blog_stats_handler))
        .route("/my", get(my_blogs_handler))
        // GET resolves by slug; PUT and DELETE take the public UUID.
        .route(
            "/{id}",
            get(get_blog_handler)
                .put(update_blog_handler)
                .delete(delete_blog_handler),
        )
        .route("/{id}/publish", patch(publish_blog_handler))
        .route(
            "/{id}/comments",
            get(list_blog_comments_handler).post(create_comment_handler),
        )
}
