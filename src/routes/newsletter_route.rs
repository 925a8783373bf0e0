use axum::{
    routing::{get, post},
    Router,
};

use crate::config::AppState;
use crate::handlers::newsletter_handler::*;

pub fn newsletter_routes() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe_handler))
        .route("/unsubscribe", post(unsubscribe_handler))
        .route("/check", get(check_subscription_handler))
        .route("/stats", get(newsletter_stats_handler))
        .route("/subscribers", get(list_subscribers_handler))
        .route("/subscribers/bulk", post(bulk_subscribers_handler))
        .route(
            "/subscribers/{id}",
            get(get_subscriber_handler)
                .put(update_subscriber_handler)
                .delete(delete_subscriber_handler),
        )
}
