use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::user::{self, UserRole};
use crate::models::auth_model::CurrentUser;
use crate::models::blog_model::PaginationMeta;
use crate::models::user_model::{
    AdminUpdateUserRequest, UpdateProfileRequest, UserListParams, UserListResponse, UserResponse,
};
use crate::repositories::user_repository::UserRepository;
use crate::utils::validator_utils::normalize_email;

pub struct UserService;

impl UserService {
    fn require_admin(actor: &CurrentUser) -> Result<(), (StatusCode, &'static str, String)> {
        if actor.role != UserRole::Admin {
            return Err((
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Administrator access required".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list(
        state: &AppState,
        actor: &CurrentUser,
        params: UserListParams,
    ) -> Result<UserListResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(actor)?;

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);

        let mut query = user::Entity::find().order_by_desc(user::Column::CreatedAt);
        if let Some(role) = params.role {
            query = query.filter(user::Column::Role.eq(role));
        }

        let paginator = query.paginate(&state.db, limit);
        let total = paginator.num_items().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;
        let users = paginator.fetch_page(page - 1).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;

        Ok(UserListResponse {
            data: users.into_iter().map(UserResponse::from).collect(),
            meta: PaginationMeta { total, page, limit },
        })
    }

    pub async fn get(
        state: &AppState,
        actor: &CurrentUser,
        public_id: Uuid,
    ) -> Result<UserResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(actor)?;

        let user = UserRepository::find_by_public_id(&state.db, public_id)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update(
        state: &AppState,
        actor: &CurrentUser,
        public_id: Uuid,
        payload: AdminUpdateUserRequest,
    ) -> Result<UserResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(actor)?;

        let user = UserRepository::find_by_public_id(&state.db, public_id)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        let new_email = payload.email.as_deref().map(normalize_email);
        if let Some(email) = &new_email {
            let existing = UserRepository::find_by_email(&state.db, email)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            if existing.map(|u| u.id != user.id).unwrap_or(false) {
                return Err((
                    StatusCode::CONFLICT,
                    "EMAIL_TAKEN",
                    "An account with this email already exists".to_string(),
                ));
            }
        }

        let mut active = user.into_active_model();
        if let Some(name) = payload.name {
            active.name = Set(name);
        }
        if let Some(email) = new_email {
            active.email = Set(email);
        }
        if let Some(role) = payload.role {
            active.role = Set(role);
        }
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update user".to_string(),
            )
        })?;

        Self::invalidate_cache(state, updated.public_id).await;

        Ok(UserResponse::from(updated))
    }

    pub async fn delete(
        state: &AppState,
        actor: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        Self::require_admin(actor)?;

        if actor.public_id == public_id {
            return Err((
                StatusCode::BAD_REQUEST,
                "SELF_DELETE",
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        let user = UserRepository::find_by_public_id(&state.db, public_id)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        user::Entity::delete_by_id(user.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete user".to_string(),
                )
            })?;

        Self::invalidate_cache(state, public_id).await;

        Ok(())
    }

    pub async fn get_profile(
        state: &AppState,
        actor: &CurrentUser,
    ) -> Result<UserResponse, (StatusCode, &'static str, String)> {
        let user = user::Entity::find_by_id(actor.id)
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(
        state: &AppState,
        actor: &CurrentUser,
        payload: UpdateProfileRequest,
    ) -> Result<UserResponse, (StatusCode, &'static str, String)> {
        let user = user::Entity::find_by_id(actor.id)
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        let new_email = payload.email.as_deref().map(normalize_email);
        if let Some(email) = &new_email {
            let existing = UserRepository::find_by_email(&state.db, email)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            if existing.map(|u| u.id != user.id).unwrap_or(false) {
                return Err((
                    StatusCode::CONFLICT,
                    "EMAIL_TAKEN",
                    "An account with this email already exists".to_string(),
                ));
            }
        }

        let mut active = user.into_active_model();
        if let Some(name) = payload.name {
            active.name = Set(name);
        }
        if let Some(email) = new_email {
            active.email = Set(email);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update profile".to_string(),
            )
        })?;

        Self::invalidate_cache(state, updated.public_id).await;

        Ok(UserResponse::from(updated))
    }

    async fn invalidate_cache(state: &AppState, public_id: Uuid) {
        let _ = state
            .redis_service
            .delete(&format!("user:{}", public_id))
            .await;
    }
}
