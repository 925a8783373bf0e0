use sea_orm::*;

use crate::entities::user::{self, UserRole};
use crate::repositories::user_repository::UserRepository;
use crate::services::auth_service::AuthService;

/// Creates the bootstrap administrator when no account uses the configured
/// email yet. Idempotent across restarts.
pub async fn seed_admin_user(db: &DatabaseConnection) -> Result<(), String> {
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@pressroom.dev".to_string());
    let password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme-admin-123".to_string());

    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await
        .map_err(|e| e.to_string())?;

    if exists.is_some() {
        return Ok(());
    }

    let password_hash = AuthService::hash_password(&password).map_err(|e| e.to_string())?;

    let admin = UserRepository::create(
        db,
        "Administrator".to_string(),
        email,
        password_hash,
        UserRole::Admin,
    )
    .await
    .map_err(|e| e.to_string())?;

    tracing::info!(email = %admin.email, "default admin user created");
    Ok(())
}
