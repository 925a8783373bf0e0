use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::{
    blog,
    category::{self, Entity as Category},
};
use crate::models::auth_model::CurrentUser;
use crate::models::category_model::*;
use crate::policy::{self, Operation, Target};
use crate::utils::slug_utils::{derive_slug, ensure_unique_slug};

pub struct CategoryService;

impl CategoryService {
    pub async fn list(
        state: &AppState,
    ) -> Result<Vec<CategoryResponse>, (StatusCode, &'static str, String)> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Failed to fetch categories".to_string(),
                )
            })?;

        Ok(categories.into_iter().map(CategoryResponse::from).collect())
    }

    pub async fn get_by_slug(
        state: &AppState,
        slug: String,
    ) -> Result<CategoryResponse, (StatusCode, &'static str, String)> {
        let model = Category::find()
            .filter(category::Column::Slug.eq(&slug))
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
                "CATEGORY_NOT_FOUND",
                "Category not found".to_string(),
            ))?;

        Ok(CategoryResponse::from(model))
    }

    pub async fn create(
        state: &AppState,
        current_user: &CurrentUser,
        payload: CreateCategoryRequest,
    ) -> Result<CategoryResponse, (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let existing = Category::find()
            .filter(category::Column::Name.eq(&payload.name))
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
                "CATEGORY_EXISTS",
                "A category with this name already exists".to_string(),
            ));
        }

        let base = derive_slug(&payload.name);
        let slug = ensure_unique_slug::<_, Category>(&state.db, category::Column::Slug, &base)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Slug check failed".to_string(),
                )
            })?;

        let now = Utc::now();
        let saved = category::ActiveModel {
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
                format!("Failed to create category: {}", e),
            )
        })?;

        Ok(CategoryResponse::from(saved))
    }

    /// Renames keep the original slug; links in the wild stay valid.
    pub async fn update(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;

        let taken = Category::find()
            .filter(category::Column::Name.eq(&payload.name))
            .filter(category::Column::Id.ne(model.id))
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
                "CATEGORY_EXISTS",
                "A category with this name already exists".to_string(),
            ));
        }

        let mut active: category::ActiveModel = model.into();
        active.name = Set(payload.name);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update category".to_string(),
            )
        })?;

        Ok(CategoryResponse::from(updated))
    }

    pub async fn delete(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        Self::require_write(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;

        let in_use = blog::Entity::find()
            .filter(blog::Column::CategoryId.eq(model.id))
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
                "CATEGORY_IN_USE",
                format!("Category is still assigned to {} blog(s)", in_use),
            ));
        }

        Category::delete_by_id(model.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete category".to_string(),
                )
            })?;

        Ok(())
    }

    fn require_write(
        current_user: &CurrentUser,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        if !policy::allows(
            &current_user.actor(),
            &Target::Category,
            Operation::Create,
        ) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Only administrators can manage categories".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_by_public_id(
        state: &AppState,
        public_id: Uuid,
    ) -> Result<category::Model, (StatusCode, &'static str, String)> {
        Category::find()
            .filter(category::Column::PublicId.eq(public_id))
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
                "CATEGORY_NOT_FOUND",
                "Category not found".to_string(),
            ))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::entities::user::UserRole;

    use super::*;

    fn category_row(id: i64, name: &str, slug: &str) -> category::Model {
        let now = Utc::now();
        category::Model {
            id,
            public_id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn renaming_to_a_taken_name_is_a_conflict() {
        let mine = category_row(1, "Rust", "rust");
        let other = category_row(2, "Go", "go");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mine.clone()]])
            .append_query_results([vec![other]])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let admin = CurrentUser {
            id: 1,
            public_id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@pressroom.dev".to_string(),
            role: UserRole::Admin,
        };
        let err = CategoryService::update(
            &state,
            &admin,
            mine.public_id,
            UpdateCategoryRequest {
                name: "Go".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1, "CATEGORY_EXISTS");
    }
}
