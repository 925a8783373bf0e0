use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::models::{auth_model::CurrentUser, tag_model::*};
use crate::services::tag_service::TagService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

pub async fn list_tags_handler(State(state): State<AppState>) -> impl IntoResponse {
    match TagService::list(&state).await {
        Ok(res) => ResponseBuilder::success("TAGS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_tag_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match TagService::get_by_slug(&state, slug).await {
        Ok(res) => ResponseBuilder::success("TAG_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn create_tag_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateTagRequest>,
) -> impl IntoResponse {
    match TagService::create(&state, &user, payload).await {
        Ok(res) => ResponseBuilder::created("TAG_CREATED", "Tag created", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_tag_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTagRequest>,
) -> impl IntoResponse {
    match TagService::update(&state, &user, id, payload).await {
        Ok(res) => ResponseBuilder::success("TAG_UPDATED", "Tag updated", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_tag_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match TagService::delete(&state, &user, id).await {
        Ok(()) => ResponseBuilder::success("TAG_DELETED", "Tag deleted", ()).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
