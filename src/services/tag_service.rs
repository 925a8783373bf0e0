use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::{
    blog_tag,
    tag::{self, Entity as Tag},
};
use crate::models::auth_model::CurrentUser;
use crate::models::tag_model::*;
use crate::policy::{self, Operation, Target};
use crate::utils::slug_utils::{derive_slug, ensure_unique_slug};

pub struct TagService;

impl TagService {
    pub async fn list(
        state: &AppState,
    ) -> Result<Vec<TagResponse>, (StatusCode, &'static str, String)> {
        let tags = Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Failed to fetch tags".to_string(),
                )
            })?;

        Ok(tags.into_iter().map(TagResponse::from).collect())
    }

    pub async fn get_by_slug(
        state: &AppState,
        slug: String,
    ) -> Result<TagResponse, (StatusCode, &'static str, String)> {
        let model = Tag::find()
            .filter(tag::Column::Slug.eq(&slug))
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
                "TAG_NOT_FOUND",
                "Tag not found".to_string(),
            ))?;

        Ok(TagResponse::from(model))
    }

    pub async fn create(
        state: &AppState,
        current_user: &CurrentUser,
        payload: CreateTagRequest,
    ) -> Result<TagResponse, (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let existing = Tag::find()
            .filter(tag::Column::Name.eq(&payload.name))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;
        if existing.is_some() {
            return Err((
                StatusCode::CONFLICT,
                "TAG_EXISTS",
                "A tag with this name already exists".to_string(),
            ));
        }

        let base = derive_slug(&payload.name);
        let slug = ensure_unique_slug::<_, Tag>(&state.db, tag::Column::Slug, &base)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Slug check failed".to_string(),
                )
            })?;

        let now = Utc::now();
        let saved = tag::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::new_v4()),
            name: Set(payload.name),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                format!("Failed to create tag: {}", e),
            )
        })?;

        Ok(TagResponse::from(saved))
    }

    pub async fn update(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: UpdateTagRequest,
    ) -> Result<TagResponse, (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;

        let taken = Tag::find()
            .filter(tag::Column::Name.eq(&payload.name))
            .filter(tag::Column::Id.ne(model.id))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;
        if taken.is_some() {
            return Err((
                StatusCode::CONFLICT,
                "TAG_EXISTS",
                "A tag with this name already exists".to_string(),
            ));
        }

        let mut active: tag::ActiveModel = model.into();
        active.name = Set(payload.name);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update tag".to_string(),
            )
        })?;

        Ok(TagResponse::from(updated))
    }

    pub async fn delete(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;

        let in_use = blog_tag::Entity::find()
            .filter(blog_tag::Column::TagId.eq(model.id))
            .count(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;
        if in_use > 0 {
            return Err((
                StatusCode::CONFLICT,
                "TAG_IN_USE",
                format!("Tag is still assigned to {} blog(s)", in_use),
            ));
        }

        Tag::delete_by_id(model.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete tag".to_string(),
                )
            })?;

        Ok(())
    }

    fn require_write(
        current_user: &CurrentUser,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        if !policy::allows(&current_user.actor(), &Target::Tag, Operation::Create) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Only administrators can manage tags".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_by_public_id(
        state: &AppState,
        public_id: Uuid,
    ) -> Result<tag::Model, (StatusCode, &'static str, String)> {
        Tag::find()
            .filter(tag::Column::PublicId.eq(public_id))
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
                "TAG_NOT_FOUND",
                "Tag not found".to_string(),
            ))
    }
}
