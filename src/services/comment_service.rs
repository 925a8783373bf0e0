use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::{
    blog::{self, Entity as Blog},
    comment::{self, CommentStatus, Entity as Comment},
    user,
};
use crate::models::auth_model::CurrentUser;
use crate::models::blog_model::PaginationMeta;
use crate::models::comment_model::*;
use crate::policy::{self, Actor, CommentScope, Operation, Target};
use crate::utils::sanitize_utils::sanitize_comment_html;
use crate::utils::spam_utils::is_spam;

pub struct CommentService;

impl CommentService {
    /// Comments on one blog, narrowed by the caller's comment scope. The blog
    /// itself must be visible first; a draft's thread does not exist for
    /// callers who cannot see the draft.
    pub async fn list_for_blog(
        state: &AppState,
        actor: &Actor,
        blog_slug: String,
        params: CommentListParams,
    ) -> Result<CommentListResponse, (StatusCode, &'static str, String)> {
        let blog = Self::visible_blog(state, actor, &blog_slug).await?;

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(20).clamp(1, 100);

        let mut query = Comment::find().filter(comment::Column::BlogId.eq(blog.id));
        query = Self::apply_scope(query, actor);
        query = query.order_by_desc(comment::Column::CreatedAt);

        let paginator = query.find_also_related(user::Entity).paginate(&state.db, limit);
        let total = paginator.num_items().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Count failed".to_string(),
            )
        })?;
        let rows = paginator.fetch_page(page - 1).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Fetch failed".to_string(),
            )
        })?;

        let mut data = Vec::new();
        for (model, author_opt) in rows {
            let author = author_opt.ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_CORRUPT",
                "Comment has no author".to_string(),
            ))?;
            data.push(Self::map_to_response(model, blog.public_id, author));
        }

        Ok(CommentListResponse {
            data,
            meta: PaginationMeta { total, page, limit },
        })
    }

    /// New comments pass through the keyword classifier: flagged content is
    /// stored as spam, everything else waits for moderation as pending.
    pub async fn create(
        state: &AppState,
        current_user: &CurrentUser,
        blog_slug: String,
        payload: CreateCommentRequest,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<CommentResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let blog = Self::visible_blog(state, &actor, &blog_slug).await?;

        let target = Target::Comment {
            status: CommentStatus::Pending,
            author_id: current_user.id,
        };
        if !policy::allows(&actor, &target, Operation::Create) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "You do not have permission to comment".to_string(),
            ));
        }

        let content = sanitize_comment_html(&payload.content);
        let status = Self::effective_status(&content, CommentStatus::Pending);

        let now = Utc::now();
        let saved = comment::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::new_v4()),
            blog_id: Set(blog.id),
            user_id: Set(current_user.id),
            content: Set(content),
            status: Set(status),
            ip_address: Set(ip_address),
            user_agent: Set(user_agent),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                format!("Failed to create comment: {}", e),
            )
        })?;

        Ok(CommentResponse {
            id: saved.public_id,
            blog_id: blog.public_id,
            author: CommentAuthorResponse {
                id: current_user.public_id,
                name: current_user.name.clone(),
            },
            content: saved.content,
            status: saved.status,
            created_at: saved.created_at,
            updated_at: saved.updated_at,
        })
    }

    pub async fn get(
        state: &AppState,
        actor: &Actor,
        public_id: Uuid,
    ) -> Result<CommentResponse, (StatusCode, &'static str, String)> {
        let (model, author) = Self::find_with_author(state, public_id).await?;

        let target = Target::Comment {
            status: model.status,
            author_id: model.user_id,
        };
        if !policy::allows(actor, &target, Operation::Read) {
            return Err((
                StatusCode::NOT_FOUND,
                "COMMENT_NOT_FOUND",
                "Comment not found".to_string(),
            ));
        }

        let blog_public_id = Self::blog_public_id(state, model.blog_id).await?;
        Ok(Self::map_to_response(model, blog_public_id, author))
    }

    /// Editing re-runs the classifier over the new content. The comment keeps
    /// its prior status unless the keyword threshold trips, in which case even
    /// an approved comment drops to spam.
    pub async fn update(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: UpdateCommentRequest,
    ) -> Result<CommentResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let (model, author) = Self::find_with_author(state, public_id).await?;

        let target = Target::Comment {
            status: model.status,
            author_id: model.user_id,
        };
        if !policy::allows(&actor, &target, Operation::Read) {
            return Err((
                StatusCode::NOT_FOUND,
                "COMMENT_NOT_FOUND",
                "Comment not found".to_string(),
            ));
        }
        if !policy::allows(&actor, &target, Operation::Update) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "You cannot edit this comment".to_string(),
            ));
        }

        let blog_id = model.blog_id;
        let content = sanitize_comment_html(&payload.content);
        let status = Self::effective_status(&content, model.status);

        let mut active: comment::ActiveModel = model.into();
        active.content = Set(content);
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update comment".to_string(),
            )
        })?;

        let blog_public_id = Self::blog_public_id(state, blog_id).await?;
        Ok(Self::map_to_response(updated, blog_public_id, author))
    }

    pub async fn delete(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let (model, _) = Self::find_with_author(state, public_id).await?;

        let target = Target::Comment {
            status: model.status,
            author_id: model.user_id,
        };
        if !policy::allows(&actor, &target, Operation::Read) {
            return Err((
                StatusCode::NOT_FOUND,
                "COMMENT_NOT_FOUND",
                "Comment not found".to_string(),
            ));
        }
        if !policy::allows(&actor, &target, Operation::Delete) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "You cannot delete this comment".to_string(),
            ));
        }

        Comment::delete_by_id(model.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete comment".to_string(),
                )
            })?;

        Ok(())
    }

    /// Moderator decision. The classifier still has the last word: approving
    /// a comment whose body trips the keyword threshold lands it back in spam.
    pub async fn moderate(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: ModerateCommentRequest,
    ) -> Result<CommentResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let (model, author) = Self::find_with_author(state, public_id).await?;

        let target = Target::Comment {
            status: model.status,
            author_id: model.user_id,
        };
        if !policy::allows(&actor, &target, Operation::Moderate) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Only administrators can moderate comments".to_string(),
            ));
        }

        let blog_id = model.blog_id;
        let status = Self::effective_status(&model.content, payload.status);
        let mut active: comment::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to moderate comment".to_string(),
            )
        })?;

        let blog_public_id = Self::blog_public_id(state, blog_id).await?;
        Ok(Self::map_to_response(updated, blog_public_id, author))
    }

    /// Moderation queue, readable by staff.
    pub async fn pending(
        state: &AppState,
        current_user: &CurrentUser,
        params: CommentListParams,
    ) -> Result<CommentListResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        if policy::comment_scope(&actor) != CommentScope::All {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Staff access required".to_string(),
            ));
        }

        let query = Comment::find()
            .filter(comment::Column::Status.eq(CommentStatus::Pending))
            .order_by_asc(comment::Column::CreatedAt);

        Self::paginate(state, query, params).await
    }

    pub async fn my_comments(
        state: &AppState,
        current_user: &CurrentUser,
        params: CommentListParams,
    ) -> Result<CommentListResponse, (StatusCode, &'static str, String)> {
        let query = Comment::find()
            .filter(comment::Column::UserId.eq(current_user.id))
            .order_by_desc(comment::Column::CreatedAt);

        Self::paginate(state, query, params).await
    }

    pub async fn stats(
        state: &AppState,
        current_user: &CurrentUser,
    ) -> Result<CommentStatsResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        if policy::comment_scope(&actor) != CommentScope::All {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Staff access required".to_string(),
            ));
        }

        let count_by = |status: CommentStatus| {
            Comment::find()
                .filter(comment::Column::Status.eq(status))
                .count(&state.db)
        };

        let total = Comment::find().count(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;
        let pending = count_by(CommentStatus::Pending).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;
        let approved = count_by(CommentStatus::Approved).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;
        let spam = count_by(CommentStatus::Spam).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;

        Ok(CommentStatsResponse {
            total,
            pending,
            approved,
            spam,
        })
    }

    /// Every save runs the classifier, moderation included: flagged content
    /// is stored as spam no matter what status was requested.
    fn effective_status(content: &str, requested: CommentStatus) -> CommentStatus {
        if is_spam(content) {
            CommentStatus::Spam
        } else {
            requested
        }
    }

    fn apply_scope(query: Select<Comment>, actor: &Actor) -> Select<Comment> {
        match policy::comment_scope(actor) {
            CommentScope::All => query,
            CommentScope::ApprovedPlusOwn(user_id) => query.filter(
                Condition::any()
                    .add(comment::Column::Status.eq(CommentStatus::Approved))
                    .add(comment::Column::UserId.eq(user_id)),
            ),
            CommentScope::ApprovedOnly => {
                query.filter(comment::Column::Status.eq(CommentStatus::Approved))
            }
        }
    }

    async fn visible_blog(
        state: &AppState,
        actor: &Actor,
        slug: &str,
    ) -> Result<blog::Model, (StatusCode, &'static str, String)> {
        let blog = Blog::find()
            .filter(blog::Column::Slug.eq(slug))
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
                "BLOG_NOT_FOUND",
                "Blog not found".to_string(),
            ))?;

        let target = Target::Blog {
            status: blog.status,
            author_id: blog.author_id,
        };
        if !policy::allows(actor, &target, Operation::Read) {
            return Err((
                StatusCode::NOT_FOUND,
                "BLOG_NOT_FOUND",
                "Blog not found".to_string(),
            ));
        }

        Ok(blog)
    }

    async fn find_with_author(
        state: &AppState,
        public_id: Uuid,
    ) -> Result<(comment::Model, user::Model), (StatusCode, &'static str, String)> {
        let found = Comment::find()
            .filter(comment::Column::PublicId.eq(public_id))
            .find_also_related(user::Entity)
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        let (model, author_opt) = found.ok_or((
            StatusCode::NOT_FOUND,
            "COMMENT_NOT_FOUND",
            "Comment not found".to_string(),
        ))?;
        let author = author_opt.ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATA_CORRUPT",
            "Comment has no author".to_string(),
        ))?;

        Ok((model, author))
    }

    async fn blog_public_id(
        state: &AppState,
        blog_id: i64,
    ) -> Result<Uuid, (StatusCode, &'static str, String)> {
        Blog::find_by_id(blog_id)
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .map(|b| b.public_id)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_CORRUPT",
                "Comment has no blog".to_string(),
            ))
    }

    async fn paginate(
        state: &AppState,
        query: Select<Comment>,
        params: CommentListParams,
    ) -> Result<CommentListResponse, (StatusCode, &'static str, String)> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(20).clamp(1, 100);

        let paginator = query.find_also_related(user::Entity).paginate(&state.db, limit);
        let total = paginator.num_items().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Count failed".to_string(),
            )
        })?;
        let rows = paginator.fetch_page(page - 1).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Fetch failed".to_string(),
            )
        })?;

        let mut data = Vec::new();
        for (model, author_opt) in rows {
            let author = author_opt.ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_CORRUPT",
                "Comment has no author".to_string(),
            ))?;
            let blog_public_id = Self::blog_public_id(state, model.blog_id).await?;
            data.push(Self::map_to_response(model, blog_public_id, author));
        }

        Ok(CommentListResponse {
            data,
            meta: PaginationMeta { total, page, limit },
        })
    }

    fn map_to_response(
        model: comment::Model,
        blog_public_id: Uuid,
        author: user::Model,
    ) -> CommentResponse {
        CommentResponse {
            id: model.public_id,
            blog_id: blog_public_id,
            author: CommentAuthorResponse {
                id: author.public_id,
                name: author.name,
            },
            content: model.content,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::entities::user::UserRole;

    use super::*;

    #[tokio::test]
    async fn editing_clean_content_keeps_the_approved_status() {
        let now = Utc::now();
        let author = user::Model {
            id: 11,
            public_id: Uuid::new_v4(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            role: UserRole::Viewer,
            is_active: true,
            password_hash: "x".to_string(),
            created_at: now,
            updated_at: now,
        };
        let existing = comment::Model {
            id: 7,
            public_id: Uuid::new_v4(),
            blog_id: 3,
            user_id: 11,
            content: "Earlier thoughts.".to_string(),
            status: CommentStatus::Approved,
            ip_address: None,
            user_agent: None,
            created_at: now,
            updated_at: now,
        };
        let updated = comment::Model {
            content: "Revised thoughts, still friendly.".to_string(),
            ..existing.clone()
        };
        let parent = blog::Model {
            id: 3,
            public_id: Uuid::new_v4(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            content: "body".to_string(),
            featured_image: None,
            category_id: None,
            author_id: 11,
            status: blog::BlogStatus::Published,
            meta_title: "Hello".to_string(),
            meta_description: String::new(),
            image_alt_text: "Hello".to_string(),
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![(existing.clone(), author.clone())]])
            .append_query_results([vec![updated]])
            .append_query_results([vec![parent]])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let current_user = CurrentUser {
            id: 11,
            public_id: author.public_id,
            name: author.name.clone(),
            email: author.email.clone(),
            role: UserRole::Viewer,
        };
        let res = CommentService::update(
            &state,
            &current_user,
            existing.public_id,
            UpdateCommentRequest {
                content: "Revised thoughts, still friendly.".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(res.status, CommentStatus::Approved);

        // The persisted status must be the prior one, not a reset to pending.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("approved"));
        assert!(!log.contains("pending"));
    }

    #[test]
    fn clean_content_keeps_the_requested_status() {
        assert_eq!(
            CommentService::effective_status("Lovely article.", CommentStatus::Approved),
            CommentStatus::Approved
        );
        assert_eq!(
            CommentService::effective_status("Lovely article.", CommentStatus::Pending),
            CommentStatus::Pending
        );
    }

    #[test]
    fn approving_spammy_content_is_overridden() {
        assert_eq!(
            CommentService::effective_status(
                "buy now, guaranteed winner",
                CommentStatus::Approved
            ),
            CommentStatus::Spam
        );
    }
}
