use axum::{
    routing::{get, post},
    Router,
};

use crate::config::AppState;
use crate::handlers::auth_handler::*;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_token_handler))
        .route("/logout", post(logout_handler))
        .route("/change-password", post(change_password_handler))
        .route("/forgot-password", post(forgot_password_handler))
        .route("/reset-password", post(reset_password_handler))
        .route(
            "/profile",
            get(get_profile_handler).put(update_profile_handler),
        )
}
