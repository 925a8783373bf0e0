use std::env;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::middleware::rate_limiter::RateLimiter;
use crate::services::email_service::EmailService;
use crate::services::redis_service::RedisService;
use crate::utils::jwt_utils::JwtKeys;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_access_minutes: i64,
    pub jwt_refresh_days: i64,
    pub smtp_from: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub frontend_url: String,
}

// With sea-orm's `mock` feature (test builds), `DatabaseConnection` is not
// `Clone`, so the derives only apply outside tests; tests get a manual `Clone`
// that shares the mock connection through its inner `Arc`.
#[cfg_attr(not(test), derive(Clone, axum::extract::FromRef))]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis_service: RedisService,
    pub email_service: EmailService,
    pub jwt_keys: JwtKeys,
    pub rate_limiter: Arc<RateLimiter>,
}

#[cfg(test)]
fn clone_mock_conn(db: &DatabaseConnection) -> DatabaseConnection {
    match db {
        DatabaseConnection::MockDatabaseConnection(conn) => {
            DatabaseConnection::MockDatabaseConnection(conn.clone())
        }
        _ => panic!("only mock connections can be cloned in tests"),
    }
}

#[cfg(test)]
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            db: clone_mock_conn(&self.db),
            redis_service: self.redis_service.clone(),
            email_service: self.email_service.clone(),
            jwt_keys: self.jwt_keys.clone(),
            rate_limiter: self.rate_limiter.clone(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over a mock connection. The Redis client and mail sender are
    /// constructed but never reached by the code under test.
    pub fn with_mock_db(db: &DatabaseConnection) -> Self {
        let db = clone_mock_conn(db);
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: String::new(),
            redis_url: "redis://127.0.0.1/".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_access_minutes: 15,
            jwt_refresh_days: 7,
            smtp_from: "noreply@pressroom.test".to_string(),
            mail_api_url: "http://localhost:8025/api/v1/send".to_string(),
            mail_api_key: String::new(),
            frontend_url: "http://localhost:3000".to_string(),
        };

        Self {
            db,
            redis_service: RedisService::new(&config),
            email_service: EmailService::new(&config),
            jwt_keys: JwtKeys::new(&config),
            rate_limiter: Arc::new(RateLimiter::new(100, std::time::Duration::from_secs(60))),
        }
    }
}

impl Config {
    pub fn init() -> Config {
        let server_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .expect("PORT must be a number");

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let redis_url = env::var("REDIS_URL").expect("REDIS_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let jwt_access_minutes = env::var("JWT_ACCESS_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()
            .expect("JWT_ACCESS_MINUTES must be a number");
        let jwt_refresh_days = env::var("JWT_REFRESH_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .expect("JWT_REFRESH_DAYS must be a number");

        let smtp_from =
            env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@pressroom.dev".to_string());
        let mail_api_url = env::var("MAIL_API_URL")
            .unwrap_or_else(|_| "http://localhost:8025/api/v1/send".to_string());
        let mail_api_key = env::var("MAIL_API_KEY").unwrap_or_default();
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Config {
            server_host,
            server_port,
            database_url,
            redis_url,
            jwt_secret,
            jwt_access_minutes,
            jwt_refresh_days,
            smtp_from,
            mail_api_url,
            mail_api_key,
            frontend_url,
        }
    }
}
