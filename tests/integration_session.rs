mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{create_test_user, send, setup_test_app, token_for};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

const PROTECTED: &[(&str, &str)] = &[
    ("GET", "/api/me"),
    ("GET", "/api/users"),
    ("POST", "/api/users"),
    ("GET", "/api/departments"),
    ("GET", "/api/semesters"),
    ("GET", "/api/semesters/active"),
    ("GET", "/api/students"),
    ("GET", "/api/teachers"),
    ("GET", "/api/courses"),
    ("GET", "/api/grades"),
    ("POST", "/api/grades"),
    ("GET", "/api/documents"),
    ("POST", "/api/documents/expire"),
    ("GET", "/api/recommendations"),
    ("GET", "/api/parents/me/children"),
    ("GET", "/api/dashboard/admin"),
    ("GET", "/api/dashboard/student"),
    ("GET", "/api/reports/grades"),
    ("GET", "/api/reports/enrollment-trend"),
    ("GET", "/api/does-not-exist"),
];

#[sqlx::test(migrations = "./migrations")]
async fn test_health_is_public(pool: PgPool) {
    let app = setup_test_app(pool);
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_session_is_unauthorized_everywhere(pool: PgPool) {
    let app = setup_test_app(pool);

    for (method, uri) in PROTECTED {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body["error"].is_string(), "{method} {uri}");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_token_is_unauthorized(pool: PgPool) {
    let app = setup_test_app(pool);
    let (status, _) = send(&app, "GET", "/api/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_identity_is_unauthorized(pool: PgPool) {
    let app = setup_test_app(pool);
    let token = token_for("nobody");
    let (status, _) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_inactive_account_is_forbidden(pool: PgPool) {
    let user = create_test_user(&pool, "dormant", "student").await;
    sqlx::query("UPDATE users SET status = 'inactive' WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let app = setup_test_app(pool);
    let (status, _) = send(&app, "GET", "/api/me", Some(&user.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_me_returns_profile(pool: PgPool) {
    let student = create_test_user(&pool, "stu1", "student").await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/me", Some(&student.token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "stu1@example.com");
    assert_eq!(body["role"], "student");
    assert_eq!(body["role_label"], "Student");
    assert!(body["display_id"].as_str().unwrap().starts_with("STU-"));
    assert_eq!(body["student_id"], json!(student.student_id.unwrap()));
    assert!(body["teacher_id"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_session_cookie_is_accepted(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let app = setup_test_app(pool);

    let request = Request::builder()
        .uri("/api/me")
        .header("cookie", format!("__session={}", admin.token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
