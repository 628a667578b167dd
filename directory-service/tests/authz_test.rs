//! Authentication, authorization, and input-validation rejections.
//!
//! These tests run against a router with a lazy (never-connected) pool: any
//! request that reached the store would fail with a 500, so the asserted
//! 400/401/403 statuses also prove the store was untouched.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{app_without_db, bearer, TEST_API_KEY, TEST_JWT_SECRET};
use directory_service::config::JwtConfig;
use directory_service::services::ability::Role;
use directory_service::services::JwtService;
use http_body_util::BodyExt;
use tower::util::ServiceExt;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_credentials_is_unauthorized() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(Request::builder().uri("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_api_key_is_unauthorized() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .header("x-api-key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_api_key_does_not_fall_through_to_bearer() {
    let (app, jwt) = app_without_db();

    // A valid admin bearer token must not rescue a bad API key.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .header("x-api-key", "wrong-key")
                .header(header::AUTHORIZATION, bearer(&jwt, Role::Admin, None))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_bearer_token_is_unauthorized() {
    let (app, _) = app_without_db();

    let stale = JwtService::new(&JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        token_expiry_minutes: -10,
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users")
                .header(
                    header::AUTHORIZATION,
                    bearer(&stale, Role::User, Some(Uuid::new_v4())),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_role_cannot_create_users() {
    let (app, jwt) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header(
                    header::AUTHORIZATION,
                    bearer(&jwt, Role::User, Some(Uuid::new_v4())),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"firstName": "Ada", "lastName": "Lovelace", "emails": []}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn api_key_caller_cannot_mutate() {
    let (app, _) = app_without_db();
    let target = Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", target))
                .header("x-api-key", TEST_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn anonymous_role_cannot_update() {
    let (app, jwt) = app_without_db();
    let target = Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/users/{}", target))
                .header(header::AUTHORIZATION, bearer(&jwt, Role::Anonymous, None))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"firstName": "Grace"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_cannot_update_someone_elses_record() {
    let (app, jwt) = app_without_db();

    let caller = Uuid::new_v4();
    let target = Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/users/{}", target))
                .header(header::AUTHORIZATION, bearer(&jwt, Role::User, Some(caller)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"firstName": "Grace"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("your own record"));
}

#[tokio::test]
async fn user_cannot_delete_someone_elses_record() {
    let (app, jwt) = app_without_db();

    let caller = Uuid::new_v4();
    let target = Uuid::new_v4();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/{}", target))
                .header(header::AUTHORIZATION, bearer(&jwt, Role::User, Some(caller)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn pagination_limit_above_100_is_rejected_before_store_access() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users?limit=101")
                .header("x-api-key", TEST_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_offset_is_rejected_before_store_access() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users?offset=-1")
                .header("x-api-key", TEST_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_user_id_is_rejected() {
    let (app, _) = app_without_db();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/not-a-uuid")
                .header("x-api-key", TEST_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_body_validation_failures_are_bad_request() {
    let (app, jwt) = app_without_db();

    // Empty firstName
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header(header::AUTHORIZATION, bearer(&jwt, Role::Admin, None))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"firstName": "", "lastName": "Lovelace", "emails": []}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed nested email
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header(header::AUTHORIZATION, bearer(&jwt, Role::Admin, None))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"firstName": "Ada", "lastName": "Lovelace", "emails": [{"email": "nope"}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
