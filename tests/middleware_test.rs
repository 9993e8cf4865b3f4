use std::env;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use arborist_exam_backend::middleware;
use arborist_exam_backend::models::user::User;

fn init_test_config() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("DATABASE_URL", "postgres://localhost/arborist_test");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("PAYMENT_WEBHOOK_SECRET", "whsec_test");
    env::set_var("PAYMENT_API_URL", "http://localhost:9090");
    env::set_var("FRONTEND_URL", "http://localhost:3000");
    env::set_var("STUDENT_RPS", "100");
    env::set_var("ADMIN_RPS", "100");
    // Several tests share the process; first init wins with these values.
    let _ = arborist_exam_backend::config::init_config();
}

fn user(role: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        name: "Alice".to_string(),
        language: "en".to_string(),
        role: role.to_string(),
        password_hash: String::new(),
        created_at: now,
        updated_at: now,
    }
}

async fn ok() -> StatusCode {
    StatusCode::OK
}

#[tokio::test]
async fn bearer_auth_rejects_missing_and_bad_tokens() {
    init_test_config();
    let app = Router::new()
        .route("/protected", get(ok))
        .layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ));

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = middleware::auth::issue_token(&user("student")).unwrap();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_gate_refuses_students() {
    init_test_config();
    let app = Router::new()
        .route("/admin-only", get(ok))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin));

    let student_token = middleware::auth::issue_token(&user("student")).unwrap();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin-only")
                .header("authorization", format!("Bearer {}", student_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin_token = middleware::auth::issue_token(&user("admin")).unwrap();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/admin-only")
                .header("authorization", format!("Bearer {}", admin_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn rate_limiter_returns_429_past_the_window_limit() {
    init_test_config();
    let app = Router::new().route("/limited", get(ok)).layer(
        axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(2),
            middleware::rate_limit::rps_middleware,
        ),
    );

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/limited").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .oneshot(Request::builder().uri("/limited").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}
