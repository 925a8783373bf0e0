use axum::{
    routing::{get, patch},
    Router,
};

use crate::config::AppState;
use crate::handlers::comment_handler::*;

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending_comments_handler))
        .route("/my", get(my_comments_handler))
        .route("/stats", get(comment_stats_handler))
        .route(
            "/{id}",
            get(get_comment_handler)
                .put(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .route("/{id}/moderate", patch(moderate_comment_handler))
}
