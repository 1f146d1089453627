mod common;

use axum::http::StatusCode;
use common::{
    create_course, create_department, create_semester, create_test_user, enroll, link_parent,
    send, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_role_gate_rejects_other_roles(pool: PgPool) {
    let student = create_test_user(&pool, "stu", "student").await;
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let parent = create_test_user(&pool, "par", "parent").await;
    let admin = create_test_user(&pool, "adm", "admin").await;
    let app = setup_test_app(pool);

    let cases = [
        (&student, "GET", "/api/users"),
        (&teacher, "GET", "/api/users"),
        (&parent, "GET", "/api/students"),
        (&student, "GET", "/api/students"),
        (&student, "GET", "/api/dashboard/admin"),
        (&teacher, "GET", "/api/dashboard/student"),
        (&admin, "GET", "/api/dashboard/parent"),
        (&parent, "GET", "/api/dashboard/teacher"),
        (&student, "GET", "/api/reports/grades"),
        (&teacher, "GET", "/api/reports/enrollment-trend"),
        (&admin, "GET", "/api/parents/me/children"),
        (&teacher, "POST", "/api/documents/expire"),
    ];

    for (user, method, uri) in cases {
        let (status, body) = send(&app, method, uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {method} {uri}", user.external_id);
        assert!(body["error"].is_string());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_role_gate_runs_before_validation(pool: PgPool) {
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/courses",
        Some(&teacher.token),
        Some(json!({ "code": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_see_only_themselves(pool: PgPool) {
    let me = create_test_user(&pool, "me", "student").await;
    let other = create_test_user(&pool, "other", "student").await;
    let app = setup_test_app(pool);

    let own = format!("/api/students/{}", me.student_id.unwrap());
    let (status, body) = send(&app, "GET", &own, Some(&me.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_number"], "me");

    let theirs = format!("/api/students/{}", other.student_id.unwrap());
    let (status, _) = send(&app, "GET", &theirs, Some(&me.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/grades", Some(&me.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parents_see_linked_children(pool: PgPool) {
    let child = create_test_user(&pool, "child", "student").await;
    let stranger = create_test_user(&pool, "stranger", "student").await;
    let parent = create_test_user(&pool, "par", "parent").await;
    link_parent(&pool, parent.id, child.student_id.unwrap()).await;
    let app = setup_test_app(pool);

    let (status, body) =
        send(&app, "GET", "/api/parents/me/children", Some(&parent.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["student_number"], "child");

    let uri = format!("/api/students/{}/summary", child.student_id.unwrap());
    let (status, _) = send(&app, "GET", &uri, Some(&parent.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/students/{}", stranger.student_id.unwrap());
    let (status, _) = send(&app, "GET", &uri, Some(&parent.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_sees_enrolled_students_only(pool: PgPool) {
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let mine = create_test_user(&pool, "mine", "student").await;
    let other = create_test_user(&pool, "other", "student").await;
    let dept = create_department(&pool, "CS").await;
    let course = create_course(&pool, "CS1", 3, dept, teacher.teacher_id).await;
    let semester = create_semester(&pool, "Fall", true).await;
    enroll(&pool, mine.student_id.unwrap(), course, semester).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, "GET", "/api/students", Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["student_number"], "mine");

    let uri = format!("/api/students/{}", other.student_id.unwrap());
    let (status, _) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/courses/{course}/students");
    let (status, body) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_links_parent_and_conflicts_on_duplicate(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let parent = create_test_user(&pool, "par", "parent").await;
    let child = create_test_user(&pool, "child", "student").await;
    let app = setup_test_app(pool);

    let uri = format!("/api/parents/{}/children", parent.id);
    let body = json!({ "student_id": child.student_id.unwrap() });

    let (status, link) = send(&app, "POST", &uri, Some(&admin.token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(link["parent_id"], json!(parent.id));

    let (status, _) = send(&app, "POST", &uri, Some(&admin.token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!(
        "/api/parents/{}/children/{}",
        parent.id,
        child.student_id.unwrap()
    );
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_creation_conflicts_on_duplicate_identity(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let app = setup_test_app(pool);

    let body = json!({
        "external_id": "idp_new",
        "email": "new@example.com",
        "first_name": "New",
        "last_name": "Student",
        "role": "student"
    });

    let (status, user) = send(&app, "POST", "/api/users", Some(&admin.token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "student");

    let (status, err) = send(&app, "POST", "/api/users", Some(&admin.token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].is_string());
}
