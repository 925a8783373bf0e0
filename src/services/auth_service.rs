use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
};

use crate::config::AppState;
use crate::entities::{password_reset_token, user, user::UserRole};
use crate::models::auth_model::{
    ChangePasswordRequest, CurrentUser, LoginRequest, RegisterRequest, TokenResponse,
};
use crate::repositories::user_repository::UserRepository;
use crate::services::email_service::EmailService;
use crate::utils::validator_utils::normalize_email;

const RESET_TOKEN_TTL_MINUTES: i64 = 30;

pub struct AuthService;

impl AuthService {
    pub async fn register(
        state: &AppState,
        payload: RegisterRequest,
    ) -> Result<user::Model, (StatusCode, &'static str, String)> {
        let email = normalize_email(&payload.email);

        let existing = UserRepository::find_by_email(&state.db, &email)
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
                "EMAIL_TAKEN",
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = Self::hash_password(&payload.password).map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HASH_ERR",
                "Failed to hash password".to_string(),
            )
        })?;

        // Self-registration always lands on the lowest role; promotion is an
        // admin-only mutation.
        UserRepository::create(
            &state.db,
            payload.name,
            email,
            password_hash,
            UserRole::Viewer,
        )
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to save user".to_string(),
            )
        })
    }

    pub async fn login(
        state: &AppState,
        payload: LoginRequest,
    ) -> Result<TokenResponse, (StatusCode, &'static str, String)> {
        let user = UserRepository::find_by_email(&state.db, &normalize_email(&payload.email))
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ))?;

        if !Self::verify_password(&payload.password, &user.password_hash) {
            return Err((
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err((
                StatusCode::UNAUTHORIZED,
                "ACCOUNT_DISABLED",
                "Account is deactivated".to_string(),
            ));
        }

        Self::issue_tokens(state, user.public_id)
    }

    pub async fn refresh(
        state: &AppState,
        refresh_token: &str,
    ) -> Result<TokenResponse, (StatusCode, &'static str, String)> {
        let claims = state
            .jwt_keys
            .validate_refresh_token(refresh_token)
            .map_err(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Refresh token is invalid or expired".to_string(),
                )
            })?;

        let blacklist_key = format!("blacklist:token:{}", claims.jti);
        if state.redis_service.exists(&blacklist_key).await {
            return Err((
                StatusCode::UNAUTHORIZED,
                "TOKEN_REVOKED",
                "This session has been logged out".to_string(),
            ));
        }

        let user = UserRepository::find_by_public_id(&state.db, claims.sub)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "USER_NOT_FOUND",
                "Account no longer exists".to_string(),
            ))?;

        if !user.is_active {
            return Err((
                StatusCode::UNAUTHORIZED,
                "ACCOUNT_DISABLED",
                "Account is deactivated".to_string(),
            ));
        }

        // Rotate: the presented refresh token is single-use.
        Self::blacklist_jti(state, &claims.jti, claims.exp).await;

        Self::issue_tokens(state, user.public_id)
    }

    /// Revokes the presented access token and, when supplied, the refresh
    /// token. Revocation lives in Redis for the remaining token lifetime.
    pub async fn logout(
        state: &AppState,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let access = state
            .jwt_keys
            .validate_access_token(access_token)
            .map_err(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Token is invalid".to_string(),
                )
            })?;

        Self::blacklist_jti(state, &access.claims.jti, access.claims.exp).await;

        if !refresh_token.is_empty() {
            if let Ok(claims) = state.jwt_keys.validate_refresh_token(refresh_token) {
                Self::blacklist_jti(state, &claims.jti, claims.exp).await;
            }
        }

        Ok(())
    }

    pub async fn change_password(
        state: &AppState,
        current_user: &CurrentUser,
        payload: ChangePasswordRequest,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let user = user::Entity::find_by_id(current_user.id)
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
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ))?;

        if !Self::verify_password(&payload.current_password, &user.password_hash) {
            return Err((
                StatusCode::BAD_REQUEST,
                "INVALID_PASSWORD",
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = Self::hash_password(&payload.new_password).map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HASH_ERR",
                "Failed to hash password".to_string(),
            )
        })?;

        let public_id = user.public_id;
        let mut active = user.into_active_model();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update password".to_string(),
            )
        })?;

        Self::invalidate_user_cache(state, public_id).await;

        Ok(())
    }

    /// Always resolves to the same success message; whether the email exists
    /// must not be observable from the outside.
    pub async fn request_password_reset(
        state: &AppState,
        email: &str,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let user = UserRepository::find_by_email(&state.db, &normalize_email(email))
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        let Some(user) = user else {
            return Ok(());
        };

        let token = Self::generate_reset_token();
        let now = Utc::now();

        password_reset_token::ActiveModel {
            public_id: Set(uuid::Uuid::new_v4()),
            user_id: Set(user.id),
            token: Set(token.clone()),
            expires_at: Set(now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)),
            used_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&state.db)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to create reset token".to_string(),
            )
        })?;

        // Delivery happens off the request path; a mail outage must not leak
        // account existence through latency or errors.
        let email_service: EmailService = state.email_service.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service.send_password_reset_email(&to, &token).await {
                tracing::warn!(error = %e, "failed to send password reset email");
            }
        });

        Ok(())
    }

    pub async fn reset_password(
        state: &AppState,
        token: &str,
        new_password: &str,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        let record = password_reset_token::Entity::find()
            .filter(password_reset_token::Column::Token.eq(token))
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
                StatusCode::BAD_REQUEST,
                "INVALID_RESET_TOKEN",
                "Reset token is invalid or expired".to_string(),
            ))?;

        if record.used_at.is_some() || record.expires_at < Utc::now() {
            return Err((
                StatusCode::BAD_REQUEST,
                "INVALID_RESET_TOKEN",
                "Reset token is invalid or expired".to_string(),
            ));
        }

        let user = user::Entity::find_by_id(record.user_id)
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
                StatusCode::BAD_REQUEST,
                "INVALID_RESET_TOKEN",
                "Reset token is invalid or expired".to_string(),
            ))?;

        let password_hash = Self::hash_password(new_password).map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HASH_ERR",
                "Failed to hash password".to_string(),
            )
        })?;

        let public_id = user.public_id;
        let mut active = user.into_active_model();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update password".to_string(),
            )
        })?;

        let mut used = record.into_active_model();
        used.used_at = Set(Some(Utc::now()));
        used.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to mark reset token".to_string(),
            )
        })?;

        Self::invalidate_user_cache(state, public_id).await;

        Ok(())
    }

    fn issue_tokens(
        state: &AppState,
        public_id: uuid::Uuid,
    ) -> Result<TokenResponse, (StatusCode, &'static str, String)> {
        let (token, _, token_expires_at) =
            state.jwt_keys.generate_access_token(public_id).map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKEN_ERR",
                    "Failed to generate token".to_string(),
                )
            })?;
        let (refresh_token, _, refresh_token_expires_at) = state
            .jwt_keys
            .generate_refresh_token(public_id)
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKEN_ERR",
                    "Failed to generate token".to_string(),
                )
            })?;

        Ok(TokenResponse {
            token,
            token_expires_at,
            refresh_token,
            refresh_token_expires_at,
            type_: "Bearer".to_string(),
        })
    }

    async fn blacklist_jti(state: &AppState, jti: &str, exp: usize) {
        let now = Utc::now().timestamp() as usize;
        let ttl = exp.saturating_sub(now) as u64;
        if ttl == 0 {
            return;
        }
        let key = format!("blacklist:token:{}", jti);
        if let Err(e) = state.redis_service.set(&key, true, ttl).await {
            tracing::warn!(error = %e, "failed to blacklist token");
        }
    }

    async fn invalidate_user_cache(state: &AppState, public_id: uuid::Uuid) {
        let _ = state
            .redis_service
            .delete(&format!("user:{}", public_id))
            .await;
    }

    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    pub fn verify_password(password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn generate_reset_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn registration_stores_the_normalized_email() {
        let saved = user::Model {
            id: 1,
            public_id: Uuid::new_v4(),
            name: "Pat".to_string(),
            email: "pat@example.com".to_string(),
            role: UserRole::Viewer,
            is_active: true,
            password_hash: "x".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([vec![saved]])
            .into_connection();
        let state = AppState::with_mock_db(&db);

        let user = AuthService::register(
            &state,
            RegisterRequest {
                name: "Pat".to_string(),
                email: "  Pat@Example.COM ".to_string(),
                password: "long-enough-pw".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.email, "pat@example.com");

        // Both the duplicate lookup and the insert must see the folded form.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("pat@example.com"));
        assert!(!log.contains("Pat@Example.COM"));
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = AuthService::hash_password("correct horse battery").unwrap();
        assert!(AuthService::verify_password("correct horse battery", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
    }

    #[test]
    fn reset_token_is_hex_and_long_enough() {
        let token = AuthService::generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Two draws must not collide.
        assert_ne!(token, AuthService::generate_reset_token());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!AuthService::verify_password("anything", "not-a-phc-string"));
    }
}
