use axum::{routing::get, Router};

use crate::config::AppState;
use crate::handlers::user_handler::*;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(list_users_handler)).route(
        "/{id}",
        get(get_user_handler)
            .put(update_user_handler)
            .delete(delete_user_handler),
    )
}
