use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::blog::BlogStatus;

fn default_status() -> BlogStatus {
    BlogStatus::Draft
}

#[derive(Deserialize, Validate)]
pub struct CreateBlogRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(min = 5, message = "Title must be at least 5 characters long"))]
    pub title: String,

    pub slug: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(min = 50, message = "Content must be at least 50 characters long"))]
    pub content: String,

    pub featured_image: Option<String>,
    pub category: Option<Uuid>,
    pub tags: Option<Vec<Uuid>>,

    #[serde(default = "default_status")]
    pub status: BlogStatus,

    #[validate(length(max = 60, message = "Meta title is limited to 60 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 160, message = "Meta description is limited to 160 characters"))]
    pub meta_description: Option<String>,
    #[validate(length(max = 125, message = "Image alt text is limited to 125 characters"))]
    pub image_alt_text: Option<String>,
}

/// Slug is deliberately absent: it is derived once at creation and never
/// re-derived or overwritten afterwards.
#[derive(Deserialize, Validate)]
pub struct UpdateBlogRequest {
    #[validate(length(min = 5, message = "Title must be at least 5 characters long"))]
    pub title: Option<String>,

    #[validate(length(min = 50, message = "Content must be at least 50 characters long"))]
    pub content: Option<String>,

    pub featured_image: Option<String>,
    pub category: Option<Uuid>,
    pub tags: Option<Vec<Uuid>>,
    pub status: Option<BlogStatus>,

    #[validate(length(max = 60, message = "Meta title is limited to 60 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 160, message = "Meta description is limited to 160 characters"))]
    pub meta_description: Option<String>,
    #[validate(length(max = 125, message = "Image alt text is limited to 125 characters"))]
    pub image_alt_text: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct PublishBlogRequest {
    pub status: BlogStatus,
}

#[derive(Deserialize)]
pub struct BlogFilterParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<BlogStatus>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlogAuthorResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub author: BlogAuthorResponse,
    pub category: Option<super::category_model::CategoryResponse>,
    pub tags: Vec<super::tag_model::TagResponse>,
    pub status: BlogStatus,
    pub meta_title: String,
    pub meta_description: String,
    pub image_alt_text: String,
    pub reading_time: u32,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct BlogListResponse {
    pub data: Vec<BlogResponse>,
    pub meta: PaginationMeta,
}

#[derive(Serialize)]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Serialize)]
pub struct BlogStatsResponse {
    pub total_published_blogs: u64,
    pub total_categories: u64,
    pub total_authors: u64,
}
