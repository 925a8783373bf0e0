use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::models::{auth_model::CurrentUser, category_model::*};
use crate::services::category_service::CategoryService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

pub async fn list_categories_handler(State(state): State<AppState>) -> impl IntoResponse {
    match CategoryService::list(&state).await {
        Ok(res) => ResponseBuilder::success("CATEGORIES_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match CategoryService::get_by_slug(&state, slug).await {
        Ok(res) => ResponseBuilder::success("CATEGORY_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn create_category_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> impl IntoResponse {
    match CategoryService::create(&state, &user, payload).await {
        Ok(res) => {
            ResponseBuilder::created("CATEGORY_CREATED", "Category created", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_category_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> impl IntoResponse {
    match CategoryService::update(&state, &user, id, payload).await {
        Ok(res) => {
            ResponseBuilder::success("CATEGORY_UPDATED", "Category updated", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_category_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match CategoryService::delete(&state, &user, id).await {
        Ok(()) => {
            ResponseBuilder::success("CATEGORY_DELETED", "Category deleted", ()).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
