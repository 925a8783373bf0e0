use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::middleware::rate_limiter::throttled;
use crate::models::{auth_model::AuthContext, auth_model::CurrentUser, blog_model::*};
use crate::services::blog_service::BlogService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

const CREATE_LIMIT: usize = 10;
const ONE_HOUR: Duration = Duration::from_secs(60 * 60);

pub async fn list_blogs_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<BlogFilterParams>,
) -> impl IntoResponse {
    match BlogService::list(&state, &ctx.actor(), params).await {
        Ok(res) => ResponseBuilder::success("BLOGS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_blog_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match BlogService::get_by_slug(&state, &ctx.actor(), slug).await {
        Ok(res) => ResponseBuilder::success("BLOG_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn create_blog_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateBlogRequest>,
) -> impl IntoResponse {
    let key = user.public_id.to_string();
    if !state
        .rate_limiter
        .check_scoped("blog-create", &key, CREATE_LIMIT, ONE_HOUR)
        .await
    {
        return throttled();
    }

    match BlogService::create(&state, &user, payload).await {
        Ok(res) => ResponseBuilder::created("BLOG_CREATED", "Blog created", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_blog_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBlogRequest>,
) -> impl IntoResponse {
    match BlogService::update(&state, &user, id, payload).await {
        Ok(res) => ResponseBuilder::success("BLOG_UPDATED", "Blog updated", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_blog_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match BlogService::delete(&state, &user, id).await {
        Ok(()) => ResponseBuilder::success("BLOG_DELETED", "Blog deleted", ()).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn publish_blog_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<PublishBlogRequest>,
) -> impl IntoResponse {
    match BlogService::publish(&state, &user, id, payload).await {
        Ok(res) => {
            ResponseBuilder::success("BLOG_STATUS_CHANGED", "Blog status updated", res)
                .into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn my_blogs_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<BlogFilterParams>,
) -> impl IntoResponse {
    match BlogService::my_blogs(&state, &user, params).await {
        Ok(res) => ResponseBuilder::success("BLOGS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn featured_blogs_handler(State(state): State<AppState>) -> impl IntoResponse {
    match BlogService::featured(&state).await {
        Ok(res) => ResponseBuilder::success("BLOGS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn blog_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    match BlogService::stats(&state).await {
        Ok(res) => ResponseBuilder::success("STATS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
