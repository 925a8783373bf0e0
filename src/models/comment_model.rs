use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::comment::CommentStatus;

#[derive(Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Comment must be between 10 and 1000 characters"
    ))]
    pub content: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Comment must be between 10 and 1000 characters"
    ))]
    pub content: String,
}

#[derive(Deserialize, Validate)]
pub struct ModerateCommentRequest {
    pub status: CommentStatus,
}

#[derive(Deserialize)]
pub struct CommentListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct CommentAuthorResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub author: CommentAuthorResponse,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct CommentListResponse {
    pub data: Vec<CommentResponse>,
    pub meta: super::blog_model::PaginationMeta,
}

#[derive(Serialize)]
pub struct CommentStatsResponse {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub spam: u64,
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn content_shorter_than_ten_chars_fails_validation() {
        let too_short = CreateCommentRequest {
            content: "too short".to_string(),
        };
        assert!(too_short.validate().is_err());

        let long_enough = CreateCommentRequest {
            content: "just long enough".to_string(),
        };
        assert!(long_enough.validate().is_ok());
    }
}
