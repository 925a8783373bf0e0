use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::middleware::rate_limiter::{client_ip, throttled};
use crate::models::{auth_model::CurrentUser, newsletter_model::*};
use crate::services::newsletter_service::NewsletterService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::validated_wrapper::ValidatedJson;

const SUBSCRIBE_LIMIT: usize = 5;
const ONE_MINUTE: Duration = Duration::from_secs(60);

pub async fn subscribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<SubscribeRequest>,
) -> impl IntoResponse {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check_scoped("newsletter", &ip, SUBSCRIBE_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    match NewsletterService::subscribe(&state, payload.email).await {
        Ok(res) => {
            ResponseBuilder::created("SUBSCRIBED", "Subscribed to newsletter", res).into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn unsubscribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<UnsubscribeRequest>,
) -> impl IntoResponse {
    let ip = client_ip(&headers);
    if !state
        .rate_limiter
        .check_scoped("newsletter", &ip, SUBSCRIBE_LIMIT, ONE_MINUTE)
        .await
    {
        return throttled();
    }

    match NewsletterService::unsubscribe(&state, payload.email).await {
        Ok(res) => {
            ResponseBuilder::success("UNSUBSCRIBED", "Unsubscribed from newsletter", res)
                .into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn check_subscription_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckSubscriptionParams>,
) -> impl IntoResponse {
    match NewsletterService::check(&state, params.email).await {
        Ok(res) => ResponseBuilder::success("SUBSCRIPTION_CHECKED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn list_subscribers_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<SubscriberListParams>,
) -> impl IntoResponse {
    match NewsletterService::list(&state, &user, params).await {
        Ok(res) => ResponseBuilder::success("SUBSCRIBERS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn get_subscriber_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match NewsletterService::get(&state, &user, id).await {
        Ok(res) => ResponseBuilder::success("SUBSCRIBER_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn update_subscriber_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSubscriberRequest>,
) -> impl IntoResponse {
    match NewsletterService::update(&state, &user, id, payload).await {
        Ok(res) => {
            ResponseBuilder::success("SUBSCRIBER_UPDATED", "Subscriber updated", res)
                .into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn delete_subscriber_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match NewsletterService::delete(&state, &user, id).await {
        Ok(()) => {
            ResponseBuilder::success("SUBSCRIBER_DELETED", "Subscriber deleted", ())
                .into_response()
        }
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn bulk_subscribers_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<BulkSubscriberRequest>,
) -> impl IntoResponse {
    match NewsletterService::bulk(&state, &user, payload).await {
        Ok(affected) => ResponseBuilder::success(
            "SUBSCRIBERS_UPDATED",
            &format!("{} subscriber(s) affected", affected),
            affected,
        )
        .into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}

pub async fn newsletter_stats_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> impl IntoResponse {
    match NewsletterService::stats(&state, &user).await {
        Ok(res) => ResponseBuilder::success("STATS_FETCHED", "Success", res).into_response(),
        Err((status, code, msg)) => {
            ResponseBuilder::error::<()>(status, code, &msg).into_response()
        }
    }
}
