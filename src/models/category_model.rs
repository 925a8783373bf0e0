use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::category;

#[derive(Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(max = 100, message = "Name is limited to 100 characters"))]
    pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(length(max = 100, message = "Name is limited to 100 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.public_id,
            name: model.name,
            slug: model.slug,
        }
    }
}
