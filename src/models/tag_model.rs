use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::tag;

#[derive(Deserialize, Validate)]
pub struct CreateTagRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(max = 50, message = "Name is limited to 50 characters"))]
    pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(max = 50, message = "Name is limited to 50 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.public_id,
            name: model.name,
            slug: model.slug,
        }
    }
}
