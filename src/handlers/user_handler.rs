use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::models::{auth_model::CurrentUser, user_model::*};
use crate::services::user_service::UserService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

pub async fn list_users_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<UserListParams>,
) -> impl IntoResponse {
    match UserService::list(&state, &user, params).await {
        Ok(res) => ResponseBuilder::success("USERS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match UserService::get(&state, &user, id).await {
        Ok(res) => ResponseBuilder::success("USER_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AdminUpdateUserRequest>,
) -> impl IntoResponse {
    match UserService::update(&state, &user, id, payload).await {
        Ok(res) => ResponseBuilder::success("USER_UPDATED", "User updated", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match UserService::delete(&state, &user, id).await {
        Ok(()) => ResponseBuilder::success("USER_DELETED", "User deleted", ()).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
