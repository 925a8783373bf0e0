use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::config::AppState;
use crate::models::auth_model::*;
use crate::models::user_model::UserResponse;
use crate::middleware::rate_limiter::{client_ip, throttled};
use crate::services::auth_service::AuthService;
use crate::services::user_service::UserService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

const REGISTER_LIMIT: usize = 5;
const LOGIN_LIMIT: usize = 10;
const RESET_LIMIT: usize = 3;
const ONE_MINUTE: Duration = Duration::from_secs(60);

pub async fn register_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> impl IntoResponse {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check_scoped("register", &ip, REGISTER_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    match AuthService::register(&state, payload).await {
        Ok(user) => ResponseBuilder::created(
            "USER_REGISTERED",
            "Account created",
            UserResponse::from(user),
        )
        .into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> impl IntoResponse {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check_scoped("login", &ip, LOGIN_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    match AuthService::login(&state, payload).await {
        Ok(tokens) => {
            ResponseBuilder::success("LOGIN_SUCCESS", "Logged in", tokens).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn refresh_token_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> impl IntoResponse {
    match AuthService::refresh(&state, &payload.refresh_token).await {
        Ok(tokens) => {
            ResponseBuilder::success("TOKEN_REFRESHED", "Token refreshed", tokens).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LogoutRequest>,
) -> impl IntoResponse {
    let access_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    if access_token.is_empty() {
        return ResponseBuilder::error::<()>(
            StatusCode::UNAUTHORIZED,
            "AUTH_REQUIRED",
            "Authentication required",
        )
        .into_response();
    }

    match AuthService::logout(&state, &access_token, &payload.refresh_token).await {
        Ok(()) => ResponseBuilder::success("LOGOUT_SUCCESS", "Logged out", ()).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn change_password_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> impl IntoResponse {
    match AuthService::change_password(&state, &user, payload).await {
        Ok(()) => {
            ResponseBuilder::success("PASSWORD_CHANGED", "Password updated", ()).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

/// Responds identically whether or not the email is registered.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> impl IntoResponse {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check_scoped("password-reset", &ip, RESET_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    match AuthService::request_password_reset(&state, &payload.email).await {
        Ok(()) => ResponseBuilder::success(
            "RESET_REQUESTED",
            "If the email exists, a reset link has been sent",
            (),
        )
        .into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn reset_password_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> impl IntoResponse {
    match AuthService::reset_password(&state, &payload.token, &payload.new_password).await {
        Ok(()) => {
            ResponseBuilder::success("PASSWORD_RESET", "Password has been reset", ())
                .into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> impl IntoResponse {
    match UserService::get_profile(&state, &user).await {
        Ok(profile) => {
            ResponseBuilder::success("PROFILE_FETCHED", "Success", profile).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<crate::models::user_model::UpdateProfileRequest>,
) -> impl IntoResponse {
    match UserService::update_profile(&state, &user, payload).await {
        Ok(profile) => {
            ResponseBuilder::success("PROFILE_UPDATED", "Profile updated", profile).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
