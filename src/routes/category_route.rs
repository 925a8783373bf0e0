use axum::{routing::get, Router};

use crate::config::AppState;
use crate::handlers::category_handler::*;

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/{id}",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
}
