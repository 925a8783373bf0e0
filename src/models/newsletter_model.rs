use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::newsletter_subscriber;

#[derive(Deserialize, Validate)]
pub struct SubscribeRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::utils::validator_utils::validate_required"))]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateSubscriberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkSubscriberAction {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Deserialize)]
pub struct BulkSubscriberRequest {
    pub action: BulkSubscriberAction,
    pub ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct CheckSubscriptionParams {
    pub email: String,
}

#[derive(Deserialize)]
pub struct SubscriberListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub subscription_date: chrono::DateTime<chrono::Utc>,
    pub unsubscribed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<newsletter_subscriber::Model> for SubscriberResponse {
    fn from(model: newsletter_subscriber::Model) -> Self {
        Self {
            id: model.public_id,
            email: model.email,
            is_active: model.is_active,
            subscription_date: model.subscription_date,
            unsubscribed_at: model.unsubscribed_at,
        }
    }
}

#[derive(Serialize)]
pub struct SubscriberListResponse {
    pub data: Vec<SubscriberResponse>,
    pub meta: super::blog_model::PaginationMeta,
}

#[derive(Serialize)]
pub struct SubscriptionCheckResponse {
    pub email: String,
    pub subscribed: bool,
}

#[derive(Serialize)]
pub struct NewsletterStatsResponse {
    pub total: u64,
    pub active: u64,
    pub unsubscribed: u64,
}
