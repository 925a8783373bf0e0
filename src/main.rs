mod config;
mod entities;
mod handlers;
mod middleware;
mod models;
mod policy;
mod repositories;
mod routes;
mod seeders;
mod services;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sea_orm::Database;

use config::{AppState, Config};
use services::email_service::EmailService;
use services::redis_service::RedisService;
use utils::jwt_utils::JwtKeys;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cfg = Config::init();
    tracing::info!("starting pressroom backend");

    let db = Database::connect(&cfg.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("database connected");

    if let Err(e) = seeders::run_seeders(&db).await {
        tracing::error!(error = %e, "seeding failed");
    }

    let redis_service = RedisService::new(&cfg);
    if let Err(e) = redis_service.check_connection().await {
        panic!("Redis connection failed: {}", e);
    }
    tracing::info!("redis connected");

    let email_service = EmailService::new(&cfg);
    let jwt_keys = JwtKeys::new(&cfg);
    let rate_limiter = Arc::new(middleware::rate_limiter::RateLimiter::new(
        100,
        Duration::from_secs(60),
    ));

    let state = AppState {
        db,
        redis_service,
        email_service,
        jwt_keys,
        rate_limiter,
    };

    let app = routes::create_routes(state.clone()).with_state(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server_host, cfg.server_port)
        .parse()
        .expect("Invalid address");
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
