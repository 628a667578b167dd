//! Common test utilities for directory-service integration tests.
#![allow(dead_code)]

use axum::Router;
use directory_service::config::{
    DatabaseConfig, DirectoryConfig, Environment, JwtConfig, SecurityConfig,
};
use directory_service::services::ability::Role;
use directory_service::services::{Database, JwtService};
use directory_service::{build_router, AppState};
use service_core::config::Config as CommonConfig;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

pub fn test_config(database_url: &str) -> DirectoryConfig {
    DirectoryConfig {
        common: CommonConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "directory-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 2,
            min_connections: 1,
        },
        security: SecurityConfig {
            api_key: TEST_API_KEY.to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            token_expiry_minutes: 15,
        },
        swagger_enabled: false,
    }
}

/// Router backed by a lazy pool: requests that never reach the store can be
/// exercised without a running database (a request that did touch the store
/// would surface as a 500).
pub fn app_without_db() -> (Router, JwtService) {
    let config = test_config("postgres://localhost:1/unreachable");
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("Failed to build lazy pool");
    let db = Database::from_pool(pool);
    let jwt = JwtService::new(&config.jwt);

    let state = AppState {
        config,
        db,
        jwt: jwt.clone(),
    };

    (build_router(state), jwt)
}

/// Router backed by a live PostgreSQL, with migrations applied.
pub async fn app_with_db() -> (Router, JwtService, Database) {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for database-backed tests");

    let config = test_config(&database_url);
    let db = Database::new(&database_url, 2, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");

    let jwt = JwtService::new(&config.jwt);

    let state = AppState {
        config,
        db: db.clone(),
        jwt: jwt.clone(),
    };

    (build_router(state), jwt, db)
}

/// `Authorization` header value for a signed bearer token.
pub fn bearer(jwt: &JwtService, role: Role, sub: Option<Uuid>) -> String {
    let token = jwt
        .generate_token(sub, role)
        .expect("Failed to generate test token");
    format!("Bearer {}", token)
}
