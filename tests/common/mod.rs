#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use registrar::registrar_auth::issue_session_token;
use registrar::registrar_config::{AcademicConfig, CorsConfig, IdentityConfig};
use registrar::router::init_router;
use registrar::state::AppState;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn identity_config() -> IdentityConfig {
    IdentityConfig::with_secret(TEST_SECRET)
}

pub fn setup_test_app(pool: PgPool) -> Router {
    let state = AppState {
        db: pool,
        identity_config: identity_config(),
        cors_config: CorsConfig::from_env(),
        academic_config: AcademicConfig::default(),
    };
    init_router(state)
}

pub struct TestUser {
    pub id: Uuid,
    pub external_id: String,
    pub token: String,
    pub student_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
}

pub fn token_for(external_id: &str) -> String {
    issue_session_token(external_id, None, 3600, &identity_config()).unwrap()
}

/// Insert a user with its student or teacher profile and mint a session
/// for it. `external_id` doubles as email local part and student number.
pub async fn create_test_user(pool: &PgPool, external_id: &str, role: &str) -> TestUser {
    let id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO users (external_id, email, first_name, last_name, role)
           VALUES ($1, $1 || '@example.com', 'Test', $1, $2::user_role)
           RETURNING id"#,
    )
    .bind(external_id)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    let student_id = if role == "student" {
        Some(
            sqlx::query_scalar(
                "INSERT INTO students (user_id, student_number) VALUES ($1, $2) RETURNING id",
            )
            .bind(id)
            .bind(external_id)
            .fetch_one(pool)
            .await
            .unwrap(),
        )
    } else {
        None
    };

    let teacher_id = if role == "teacher" {
        Some(
            sqlx::query_scalar("INSERT INTO teachers (user_id) VALUES ($1) RETURNING id")
                .bind(id)
                .fetch_one(pool)
                .await
                .unwrap(),
        )
    } else {
        None
    };

    TestUser {
        id,
        external_id: external_id.to_string(),
        token: token_for(external_id),
        student_id,
        teacher_id,
    }
}

pub async fn create_department(pool: &PgPool, code: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO departments (code, name) VALUES ($1, $1) RETURNING id")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_course(
    pool: &PgPool,
    code: &str,
    credits: i32,
    department_id: Uuid,
    teacher_id: Option<Uuid>,
) -> Uuid {
    sqlx::query_scalar(
        r#"INSERT INTO courses (code, name, credits, department_id, teacher_id)
           VALUES ($1, $1, $2, $3, $4) RETURNING id"#,
    )
    .bind(code)
    .bind(credits)
    .bind(department_id)
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_semester(pool: &PgPool, name: &str, active: bool) -> Uuid {
    sqlx::query_scalar(
        r#"INSERT INTO semesters (name, start_date, end_date, is_active)
           VALUES ($1, '2025-09-01', '2025-12-20', $2) RETURNING id"#,
    )
    .bind(name)
    .bind(active)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn enroll(pool: &PgPool, student_id: Uuid, course_id: Uuid, semester_id: Uuid) {
    sqlx::query("INSERT INTO enrollments (student_id, course_id, semester_id) VALUES ($1, $2, $3)")
        .bind(student_id)
        .bind(course_id)
        .bind(semester_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn link_parent(pool: &PgPool, parent_id: Uuid, student_id: Uuid) {
    sqlx::query("INSERT INTO parent_students (parent_id, student_id) VALUES ($1, $2)")
        .bind(parent_id)
        .bind(student_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Send one request and return the status with the JSON body (`Null` when
/// the body is empty or not JSON).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
