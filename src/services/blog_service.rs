use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::{
    blog::{self, BlogStatus, Entity as Blog},
    blog_tag, category, tag, user,
};
use crate::models::auth_model::CurrentUser;
use crate::models::blog_model::*;
use crate::models::category_model::CategoryResponse;
use crate::models::tag_model::TagResponse;
use crate::policy::{self, Actor, BlogScope, Operation, Target};
use crate::services::newsletter_service::NewsletterService;
use crate::utils::sanitize_utils::sanitize_blog_html;
use crate::utils::slug_utils::{derive_slug, ensure_unique_slug};

const WORDS_PER_MINUTE: u32 = 200;
const FEATURED_COUNT: u64 = 5;

pub struct BlogService;

impl BlogService {
    pub async fn list(
        state: &AppState,
        actor: &Actor,
        params: BlogFilterParams,
    ) -> Result<BlogListResponse, (StatusCode, &'static str, String)> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);

        let mut query = Blog::find();

        match policy::blog_scope(actor) {
            BlogScope::All => {
                // Staff may narrow by status explicitly.
                if let Some(status) = params.status {
                    query = query.filter(blog::Column::Status.eq(status));
                }
            }
            BlogScope::PublishedOnly => {
                // The status filter is ignored for non-staff callers; drafts
                // must never leak through query parameters.
                query = query.filter(blog::Column::Status.eq(BlogStatus::Published));
            }
        }

        if let Some(search) = params.search {
            query = query.filter(
                Condition::any()
                    .add(blog::Column::Title.contains(&search))
                    .add(blog::Column::Content.contains(&search)),
            );
        }

        if let Some(category_slug) = params.category {
            let cat = category::Entity::find()
                .filter(category::Column::Slug.eq(&category_slug))
                .one(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            match cat {
                Some(cat) => query = query.filter(blog::Column::CategoryId.eq(cat.id)),
                None => {
                    return Ok(BlogListResponse {
                        data: vec![],
                        meta: PaginationMeta {
                            total: 0,
                            page,
                            limit,
                        },
                    })
                }
            }
        }

        if let Some(tag_slug) = params.tag {
            let tag = tag::Entity::find()
                .filter(tag::Column::Slug.eq(&tag_slug))
                .one(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            match tag {
                Some(tag) => {
                    let blog_ids: Vec<i64> = blog_tag::Entity::find()
                        .filter(blog_tag::Column::TagId.eq(tag.id))
                        .all(&state.db)
                        .await
                        .map_err(|_| {
                            (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "DB_ERR",
                                "Database error".to_string(),
                            )
                        })?
                        .into_iter()
                        .map(|link| link.blog_id)
                        .collect();
                    query = query.filter(blog::Column::Id.is_in(blog_ids));
                }
                None => {
                    return Ok(BlogListResponse {
                        data: vec![],
                        meta: PaginationMeta {
                            total: 0,
                            page,
                            limit,
                        },
                    })
                }
            }
        }

        query = query
            .order_by_desc(blog::Column::PublishedAt)
            .order_by_desc(blog::Column::CreatedAt);

        Self::paginate(state, query, page, limit).await
    }

    pub async fn get_by_slug(
        state: &AppState,
        actor: &Actor,
        slug: String,
    ) -> Result<BlogResponse, (StatusCode, &'static str, String)> {
        let found = Blog::find()
            .filter(blog::Column::Slug.eq(&slug))
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

        let (blog, author_opt) = found.ok_or((
            StatusCode::NOT_FOUND,
            "BLOG_NOT_FOUND",
            "Blog not found".to_string(),
        ))?;

        // Invisible and nonexistent are indistinguishable from the outside.
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

        let author = author_opt.ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATA_CORRUPT",
            "Blog has no author".to_string(),
        ))?;

        Self::hydrate(state, blog, author).await
    }

    pub async fn create(
        state: &AppState,
        current_user: &CurrentUser,
        payload: CreateBlogRequest,
    ) -> Result<BlogResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let target = Target::Blog {
            status: BlogStatus::Draft,
            author_id: current_user.id,
        };
        if !policy::allows(&actor, &target, Operation::Create) {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "You do not have permission to create blogs".to_string(),
            ));
        }

        let duplicate = Blog::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(blog::Column::Title)))
                    .eq(payload.title.to_lowercase()),
            )
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;
        if duplicate.is_some() {
            return Err((
                StatusCode::CONFLICT,
                "TITLE_TAKEN",
                "A blog with this title already exists".to_string(),
            ));
        }

        let txn = state.db.begin().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TXN_ERR",
                "Transaction start failed".to_string(),
            )
        })?;

        let base = match &payload.slug {
            Some(s) => derive_slug(s),
            None => derive_slug(&payload.title),
        };
        let slug = ensure_unique_slug::<_, Blog>(&txn, blog::Column::Slug, &base)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Slug check failed".to_string(),
                )
            })?;

        let category_id = match payload.category {
            Some(public_id) => Some(Self::resolve_category(&txn, public_id).await?),
            None => None,
        };

        let now = Utc::now();
        let published_at = match payload.status {
            BlogStatus::Published => Some(now),
            BlogStatus::Draft => None,
        };

        let meta_title = payload
            .meta_title
            .unwrap_or_else(|| truncate_chars(&payload.title, 60));
        let image_alt_text = payload
            .image_alt_text
            .unwrap_or_else(|| truncate_chars(&payload.title, 125));

        let saved = blog::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::new_v4()),
            title: Set(payload.title),
            slug: Set(slug),
            content: Set(sanitize_blog_html(&payload.content)),
            featured_image: Set(payload.featured_image),
            category_id: Set(category_id),
            author_id: Set(current_user.id),
            status: Set(payload.status),
            meta_title: Set(meta_title),
            meta_description: Set(payload.meta_description.unwrap_or_default()),
            image_alt_text: Set(image_alt_text),
            published_at: Set(published_at),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                format!("Failed to create blog: {}", e),
            )
        })?;

        if let Some(tag_uuids) = payload.tags {
            Self::attach_tags(&txn, saved.id, tag_uuids).await?;
        }

        txn.commit().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TXN_COMMIT_ERR",
                "Transaction commit failed".to_string(),
            )
        })?;

        Self::get_by_slug(state, &actor, saved.slug).await
    }

    pub async fn update(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: UpdateBlogRequest,
    ) -> Result<BlogResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let blog = Self::find_by_public_id(state, public_id).await?;

        let target = Target::Blog {
            status: blog.status,
            author_id: blog.author_id,
        };
        if !policy::allows(&actor, &target, Operation::Update) {
            return Err((
                StatusCode::NOT_FOUND,
                "BLOG_NOT_FOUND",
                "Blog not found".to_string(),
            ));
        }

        let txn = state.db.begin().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TXN_ERR",
                "Transaction start failed".to_string(),
            )
        })?;

        let previous_status = blog.status;
        let previous_published_at = blog.published_at;
        let blog_id = blog.id;
        let slug = blog.slug.clone();

        // Retitling is bound by the same case-insensitive uniqueness rule as
        // creation; the row being edited does not count against itself.
        if let Some(title) = &payload.title {
            let duplicate = Blog::find()
                .filter(
                    Expr::expr(Func::lower(Expr::col(blog::Column::Title)))
                        .eq(title.to_lowercase()),
                )
                .filter(blog::Column::Id.ne(blog_id))
                .one(&txn)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            if duplicate.is_some() {
                return Err((
                    StatusCode::CONFLICT,
                    "TITLE_TAKEN",
                    "A blog with this title already exists".to_string(),
                ));
            }
        }

        let mut active: blog::ActiveModel = blog.into();

        if let Some(title) = payload.title {
            active.title = Set(title);
        }
        if let Some(content) = payload.content {
            active.content = Set(sanitize_blog_html(&content));
        }
        if let Some(img) = payload.featured_image {
            active.featured_image = Set(Some(img));
        }
        if let Some(category_uuid) = payload.category {
            let category_id = Self::resolve_category(&txn, category_uuid).await?;
            active.category_id = Set(Some(category_id));
        }
        if let Some(status) = payload.status {
            active.status = Set(status);
            active.published_at = Set(next_published_at(
                previous_published_at,
                previous_status,
                status,
            ));
        }
        if let Some(meta_title) = payload.meta_title {
            active.meta_title = Set(meta_title);
        }
        if let Some(meta_description) = payload.meta_description {
            active.meta_description = Set(meta_description);
        }
        if let Some(alt) = payload.image_alt_text {
            active.image_alt_text = Set(alt);
        }
        active.updated_at = Set(Utc::now());

        active.update(&txn).await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                format!("Failed to update blog: {}", e),
            )
        })?;

        if let Some(tag_uuids) = payload.tags {
            blog_tag::Entity::delete_many()
                .filter(blog_tag::Column::BlogId.eq(blog_id))
                .exec(&txn)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_WRITE_ERR",
                        "Failed to clear tags".to_string(),
                    )
                })?;
            Self::attach_tags(&txn, blog_id, tag_uuids).await?;
        }

        txn.commit().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "TXN_COMMIT_ERR",
                "Transaction commit failed".to_string(),
            )
        })?;

        Self::get_by_slug(state, &actor, slug).await
    }

    pub async fn delete(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let blog = Self::find_by_public_id(state, public_id).await?;

        let target = Target::Blog {
            status: blog.status,
            author_id: blog.author_id,
        };
        if !policy::allows(&actor, &target, Operation::Delete) {
            return Err((
                StatusCode::NOT_FOUND,
                "BLOG_NOT_FOUND",
                "Blog not found".to_string(),
            ));
        }

        Blog::delete_by_id(blog.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete blog".to_string(),
                )
            })?;

        Ok(())
    }

    /// Status transition endpoint. Newsletter fan-out happens here, and only
    /// on a genuine draft-to-published transition; re-publishing an already
    /// published blog sends nothing.
    pub async fn publish(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: PublishBlogRequest,
    ) -> Result<BlogResponse, (StatusCode, &'static str, String)> {
        let actor = current_user.actor();
        let blog = Self::find_by_public_id(state, public_id).await?;

        let target = Target::Blog {
            status: blog.status,
            author_id: blog.author_id,
        };
        if !policy::allows(&actor, &target, Operation::Moderate) {
            return Err((
                StatusCode::NOT_FOUND,
                "BLOG_NOT_FOUND",
                "Blog not found".to_string(),
            ));
        }

        let previous_status = blog.status;
        let previous_published_at = blog.published_at;
        let title = blog.title.clone();
        let slug = blog.slug.clone();

        let mut active: blog::ActiveModel = blog.into();
        active.status = Set(payload.status);
        active.published_at = Set(next_published_at(
            previous_published_at,
            previous_status,
            payload.status,
        ));
        active.updated_at = Set(Utc::now());

        active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update blog status".to_string(),
            )
        })?;

        if previous_status == BlogStatus::Draft && payload.status == BlogStatus::Published {
            // The request blocks until the full fan-out completes. Delivery
            // failures are logged inside and never fail the publish.
            let link = state.email_service.post_url(&slug);
            NewsletterService::broadcast_new_post(&state.db, &state.email_service, &title, &link)
                .await;
        }

        Self::get_by_slug(state, &actor, slug).await
    }

    /// The author's own blogs, drafts included, regardless of role.
    pub async fn my_blogs(
        state: &AppState,
        current_user: &CurrentUser,
        params: BlogFilterParams,
    ) -> Result<BlogListResponse, (StatusCode, &'static str, String)> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);

        let mut query = Blog::find().filter(blog::Column::AuthorId.eq(current_user.id));
        if let Some(status) = params.status {
            query = query.filter(blog::Column::Status.eq(status));
        }
        query = query.order_by_desc(blog::Column::CreatedAt);

        Self::paginate(state, query, page, limit).await
    }

    pub async fn featured(
        state: &AppState,
    ) -> Result<Vec<BlogResponse>, (StatusCode, &'static str, String)> {
        let blogs = Blog::find()
            .filter(blog::Column::Status.eq(BlogStatus::Published))
            .order_by_desc(blog::Column::PublishedAt)
            .limit(FEATURED_COUNT)
            .find_also_related(user::Entity)
            .all(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        let mut data = Vec::new();
        for (blog, author_opt) in blogs {
            let author = author_opt.ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_CORRUPT",
                "Blog has no author".to_string(),
            ))?;
            data.push(Self::hydrate(state, blog, author).await?);
        }
        Ok(data)
    }

    pub async fn stats(
        state: &AppState,
    ) -> Result<BlogStatsResponse, (StatusCode, &'static str, String)> {
        let total_published_blogs = Blog::find()
            .filter(blog::Column::Status.eq(BlogStatus::Published))
            .count(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        let total_categories = category::Entity::find()
            .count(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        let total_authors = Blog::find()
            .filter(blog::Column::Status.eq(BlogStatus::Published))
            .select_only()
            .column(blog::Column::AuthorId)
            .distinct()
            .count(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        Ok(BlogStatsResponse {
            total_published_blogs,
            total_categories,
            total_authors,
        })
    }

    async fn find_by_public_id(
        state: &AppState,
        public_id: Uuid,
    ) -> Result<blog::Model, (StatusCode, &'static str, String)> {
        Blog::find()
            .filter(blog::Column::PublicId.eq(public_id))
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
            ))
    }

    async fn resolve_category<C: ConnectionTrait>(
        db: &C,
        public_id: Uuid,
    ) -> Result<i64, (StatusCode, &'static str, String)> {
        category::Entity::find()
            .filter(category::Column::PublicId.eq(public_id))
            .one(db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Category lookup failed".to_string(),
                )
            })?
            .map(|c| c.id)
            .ok_or((
                StatusCode::BAD_REQUEST,
                "CATEGORY_NOT_FOUND",
                format!("Category with ID {} not found", public_id),
            ))
    }

    async fn attach_tags<C: ConnectionTrait>(
        db: &C,
        blog_id: i64,
        mut tag_uuids: Vec<Uuid>,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        // A repeated id in the payload would collide on the composite key.
        let mut seen = std::collections::HashSet::new();
        tag_uuids.retain(|id| seen.insert(*id));

        for tag_uuid in tag_uuids {
            let tag = tag::Entity::find()
                .filter(tag::Column::PublicId.eq(tag_uuid))
                .one(db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Tag lookup failed".to_string(),
                    )
                })?
                .ok_or((
                    StatusCode::BAD_REQUEST,
                    "TAG_NOT_FOUND",
                    format!("Tag with ID {} not found", tag_uuid),
                ))?;

            let link = blog_tag::ActiveModel {
                blog_id: Set(blog_id),
                tag_id: Set(tag.id),
            };
            link.insert(db).await.map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    format!("Failed to attach tag: {}", e),
                )
            })?;
        }
        Ok(())
    }

    async fn paginate(
        state: &AppState,
        query: Select<Blog>,
        page: u64,
        limit: u64,
    ) -> Result<BlogListResponse, (StatusCode, &'static str, String)> {
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
        for (blog, author_opt) in rows {
            let author = author_opt.ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATA_CORRUPT",
                "Blog has no author".to_string(),
            ))?;
            data.push(Self::hydrate(state, blog, author).await?);
        }

        Ok(BlogListResponse {
            data,
            meta: PaginationMeta { total, page, limit },
        })
    }

    async fn hydrate(
        state: &AppState,
        blog: blog::Model,
        author: user::Model,
    ) -> Result<BlogResponse, (StatusCode, &'static str, String)> {
        let category = match blog.category_id {
            Some(category_id) => category::Entity::find_by_id(category_id)
                .one(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Failed to fetch category".to_string(),
                    )
                })?,
            None => None,
        };

        let tags = blog
            .find_related(tag::Entity)
            .all(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Failed to fetch tags".to_string(),
                )
            })?;

        Ok(Self::map_to_response(blog, category, tags, author))
    }

    fn map_to_response(
        model: blog::Model,
        category: Option<category::Model>,
        tags: Vec<tag::Model>,
        author: user::Model,
    ) -> BlogResponse {
        let reading_time = reading_time_minutes(&model.content);
        BlogResponse {
            id: model.public_id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            featured_image: model.featured_image,
            author: BlogAuthorResponse {
                id: author.public_id,
                name: author.name,
            },
            category: category.map(CategoryResponse::from),
            tags: tags.into_iter().map(TagResponse::from).collect(),
            status: model.status,
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            image_alt_text: model.image_alt_text,
            reading_time,
            published_at: model.published_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// draft→published stamps the time only when no stamp exists; published→draft
/// clears it, so a revert-then-republish cycle gets a fresh stamp.
fn next_published_at(
    previous: Option<chrono::DateTime<Utc>>,
    from: BlogStatus,
    to: BlogStatus,
) -> Option<chrono::DateTime<Utc>> {
    match (from, to) {
        (BlogStatus::Draft, BlogStatus::Published) => previous.or_else(|| Some(Utc::now())),
        (BlogStatus::Published, BlogStatus::Draft) => None,
        _ => previous,
    }
}

/// Estimated minutes to read, at 200 words per minute, never below one.
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count() as u32;
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::entities::{newsletter_subscriber, user::UserRole};

    use super::*;

    #[test]
    fn revert_and_republish_stamps_a_fresh_time() {
        let first = next_published_at(None, BlogStatus::Draft, BlogStatus::Published);
        assert!(first.is_some());

        let cleared = next_published_at(first, BlogStatus::Published, BlogStatus::Draft);
        assert!(cleared.is_none());

        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = next_published_at(cleared, BlogStatus::Draft, BlogStatus::Published);
        assert!(second.unwrap() > first.unwrap());
    }

    #[test]
    fn existing_stamp_survives_non_reverting_transitions() {
        let original = Some(Utc::now());
        assert_eq!(
            next_published_at(original, BlogStatus::Draft, BlogStatus::Published),
            original
        );
        assert_eq!(
            next_published_at(original, BlogStatus::Published, BlogStatus::Published),
            original
        );
    }

    fn blog_row(status: BlogStatus, published_at: Option<chrono::DateTime<Utc>>) -> blog::Model {
        let now = Utc::now();
        blog::Model {
            id: 9,
            public_id: Uuid::new_v4(),
            title: "Launch Day".to_string(),
            slug: "launch-day".to_string(),
            content: "body".to_string(),
            featured_image: None,
            category_id: None,
            author_id: 1,
            status,
            meta_title: "Launch Day".to_string(),
            meta_description: String::new(),
            image_alt_text: "Launch Day".to_string(),
            published_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn admin_row() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@pressroom.dev".to_string(),
            role: UserRole::Admin,
            is_active: true,
            password_hash: "x".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn publishing_a_draft_fans_out_before_the_request_returns() {
        let now = Utc::now();
        let draft = blog_row(BlogStatus::Draft, None);
        let mut published = draft.clone();
        published.status = BlogStatus::Published;
        published.published_at = Some(now);
        let author = admin_row();
        let subscriber = newsletter_subscriber::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            is_active: true,
            subscription_date: now,
            unsubscribed_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![draft.clone()]])
            .append_query_results([vec![published.clone()]])
            .append_query_results([vec![subscriber]])
            .append_query_results([vec![(published, author.clone())]])
            .append_query_results([Vec::<tag::Model>::new()])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let current_user = CurrentUser {
            id: 1,
            public_id: author.public_id,
            name: author.name.clone(),
            email: author.email.clone(),
            role: UserRole::Admin,
        };
        let res = BlogService::publish(
            &state,
            &current_user,
            draft.public_id,
            PublishBlogRequest {
                status: BlogStatus::Published,
            },
        )
        .await
        .unwrap();
        assert_eq!(res.status, BlogStatus::Published);

        // The subscriber query must appear in the log: dispatch ran on the
        // request, not on a detached task.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("newsletter_subscribers"));
    }

    #[tokio::test]
    async fn retitling_to_a_taken_title_is_a_conflict() {
        let mine = blog_row(BlogStatus::Draft, None);
        let mut other = blog_row(BlogStatus::Published, Some(Utc::now()));
        other.id = 10;
        other.public_id = Uuid::new_v4();
        other.title = "Taken Title".to_string();
        other.slug = "taken-title".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mine.clone()]])
            .append_query_results([vec![other]])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let author = admin_row();
        let current_user = CurrentUser {
            id: 1,
            public_id: author.public_id,
            name: author.name,
            email: author.email,
            role: UserRole::Admin,
        };
        let err = BlogService::update(
            &state,
            &current_user,
            mine.public_id,
            UpdateBlogRequest {
                title: Some("Taken Title".to_string()),
                content: None,
                featured_image: None,
                category: None,
                tags: None,
                status: None,
                meta_title: None,
                meta_description: None,
                image_alt_text: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1, "TITLE_TAKEN");
    }

    #[tokio::test]
    async fn repeated_tag_ids_create_a_single_link() {
        let now = Utc::now();
        let tag_uuid = Uuid::new_v4();
        let tag_row = tag::Model {
            id: 4,
            public_id: tag_uuid,
            name: "rust".to_string(),
            slug: "rust".to_string(),
            created_at: now,
            updated_at: now,
        };
        let link = blog_tag::Model {
            blog_id: 9,
            tag_id: 4,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tag_row]])
            .append_query_results([vec![link]])
            .into_connection();

        BlogService::attach_tags(&db, 9, vec![tag_uuid, tag_uuid])
            .await
            .unwrap();

        let log = format!("{:?}", db.into_transaction_log());
        assert_eq!(log.matches("INSERT").count(), 1);
    }

    #[test]
    fn reading_time_never_drops_below_one_minute() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("a few short words"), 1);
    }

    #[test]
    fn reading_time_rounds_up() {
        let two_hundred_one = vec!["word"; 201].join(" ");
        assert_eq!(reading_time_minutes(&two_hundred_one), 2);

        let four_hundred = vec!["word"; 400].join(" ");
        assert_eq!(reading_time_minutes(&four_hundred), 2);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 60), "short");
    }
}
