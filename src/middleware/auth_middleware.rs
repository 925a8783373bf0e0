use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::config::AppState;
use crate::entities::user;
use crate::models::auth_model::{AuthContext, CurrentUser, UserData};
use crate::utils::api_response::ResponseBuilder;

const USER_CACHE_TTL_SECS: u64 = 15 * 60;

/// Resolves the bearer token (when present) into an [`AuthContext`] extension.
///
/// Anonymous requests pass through with an empty context so public read paths
/// can still apply role-aware visibility filtering. A token that is present
/// but invalid, revoked, or tied to a disabled account is rejected outright.
pub async fn auth_context_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(response) => return response,
    };

    let context = match token {
        None => AuthContext(None),
        Some(token) => {
            let claims = match state.jwt_keys.validate_access_token(&token) {
                Ok(data) => data.claims,
                Err(e) => {
                    let (code, message) = match e.kind() {
                        ErrorKind::ExpiredSignature => ("TOKEN_EXPIRED", "Token has expired"),
                        ErrorKind::InvalidToken => ("TOKEN_INVALID", "Token is invalid"),
                        ErrorKind::InvalidSignature => {
                            ("TOKEN_BAD_SIGNATURE", "Invalid token signature")
                        }
                        _ => ("AUTH_FAILED", "Authentication failed"),
                    };
                    return ResponseBuilder::error::<()>(StatusCode::UNAUTHORIZED, code, message)
                        .into_response();
                }
            };

            // One-way logout marker.
            let blacklist_key = format!("blacklist:token:{}", claims.jti);
            if state.redis_service.exists(&blacklist_key).await {
                return ResponseBuilder::error::<()>(
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_REVOKED",
                    "This session has been logged out",
                )
                .into_response();
            }

            let user_data = match load_user(&state, claims.sub).await {
                Ok(data) => data,
                Err(response) => return response,
            };

            if !user_data.is_active {
                return ResponseBuilder::error::<()>(
                    StatusCode::UNAUTHORIZED,
                    "ACCOUNT_DISABLED",
                    "Account is deactivated",
                )
                .into_response();
            }

            AuthContext(Some(CurrentUser {
                id: user_data.id,
                public_id: user_data.public_id,
                name: user_data.name,
                email: user_data.email,
                role: user_data.role,
            }))
        }
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

fn bearer_token(req: &Request<Body>) -> Result<Option<String>, Response> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| {
        ResponseBuilder::error::<()>(
            StatusCode::UNAUTHORIZED,
            "AUTH_INVALID_FORMAT",
            "Invalid Authorization header format",
        )
        .into_response()
    })?;

    if !auth_str.starts_with("Bearer ") {
        return Err(ResponseBuilder::error::<()>(
            StatusCode::UNAUTHORIZED,
            "AUTH_INVALID_SCHEME",
            "Invalid token format. Missing 'Bearer ' prefix",
        )
        .into_response());
    }

    Ok(Some(auth_str[7..].to_string()))
}

/// Cache -> DB lookup, keyed by the token subject.
async fn load_user(state: &AppState, public_id: uuid::Uuid) -> Result<UserData, Response> {
    let cache_key = format!("user:{}", public_id);
    if let Some(cached) = state.redis_service.get::<UserData>(&cache_key).await {
        return Ok(cached);
    }

    let user = user::Entity::find()
        .filter(user::Column::PublicId.eq(public_id))
        .one(&state.db)
        .await
        .map_err(|_| {
            ResponseBuilder::error::<()>(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error",
            )
            .into_response()
        })?
        .ok_or_else(|| {
            ResponseBuilder::error::<()>(
                StatusCode::UNAUTHORIZED,
                "USER_NOT_FOUND",
                "Account no longer exists",
            )
            .into_response()
        })?;

    let data = UserData {
        id: user.id,
        public_id: user.public_id,
        name: user.name,
        email: user.email,
        role: user.role,
        is_active: user.is_active,
    };

    let _ = state
        .redis_service
        .set(&cache_key, &data, USER_CACHE_TTL_SECS)
        .await;

    Ok(data)
}

/// Extractor for handlers that require authentication; rejects with 401 when
/// the request came through without a valid bearer token.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(|ctx| ctx.0.clone())
            .ok_or_else(|| {
                ResponseBuilder::error::<()>(
                    StatusCode::UNAUTHORIZED,
                    "AUTH_REQUIRED",
                    "Authentication required",
                )
                .into_response()
            })
    }
}
