use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::middleware::rate_limiter::{client_ip, throttled};
use crate::models::{auth_model::AuthContext, auth_model::CurrentUser, comment_model::*};
use crate::services::comment_service::CommentService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

const CREATE_LIMIT: usize = 5;
const ONE_MINUTE: Duration = Duration::from_secs(60);

pub async fn list_blog_comments_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(slug): Path<String>,
    Query(params): Query<CommentListParams>,
) -> impl IntoResponse {
    match CommentService::list_for_blog(&state, &ctx.actor(), slug, params).await {
        Ok(res) => ResponseBuilder::success("COMMENTS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> impl IntoResponse {
    let key = user.public_id.to_string();
    if !state
        .rate_limiter
        .check_scoped("comment", &key, CREATE_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    let ip = match client_ip(&headers).as_str() {
        "unknown" => None,
        ip => Some(ip.to_string()),
    };
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    match CommentService::create(&state, &user, slug, payload, ip, user_agent).await {
        Ok(res) => {
            ResponseBuilder::created("COMMENT_CREATED", "Comment submitted", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_comment_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match CommentService::get(&state, &ctx.actor(), id).await {
        Ok(res) => ResponseBuilder::success("COMMENT_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_comment_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCommentRequest>,
) -> impl IntoResponse {
    match CommentService::update(&state, &user, id, payload).await {
        Ok(res) => {
            ResponseBuilder::success("COMMENT_UPDATED", "Comment updated", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match CommentService::delete(&state, &user, id).await {
        Ok(()) => {
            ResponseBuilder::success("COMMENT_DELETED", "Comment deleted", ()).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn moderate_comment_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ModerateCommentRequest>,
) -> impl IntoResponse {
    match CommentService::moderate(&state, &user, id, payload).await {
        Ok(res) => {
            ResponseBuilder::success("COMMENT_MODERATED", "Comment moderated", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn pending_comments_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<CommentListParams>,
) -> impl IntoResponse {
    match CommentService::pending(&state, &user, params).await {
        Ok(res) => ResponseBuilder::success("COMMENTS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn my_comments_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<CommentListParams>,
) -> impl IntoResponse {
    match CommentService::my_comments(&state, &user, params).await {
        Ok(res) => ResponseBuilder::success("COMMENTS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn comment_stats_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> impl IntoResponse {
    match CommentService::stats(&state, &user).await {
        Ok(res) => ResponseBuilder::success("STATS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
