mod common;

use axum::http::StatusCode;
use common::{
    create_course, create_department, create_semester, create_test_user, enroll, link_parent,
    send, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn active_semesters(pool: &PgPool) -> Vec<Uuid> {
    sqlx::query_scalar("SELECT id FROM semesters WHERE is_active")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_semester_activation_leaves_exactly_one_active(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let app = setup_test_app(pool.clone());

    let mut ids = Vec::new();
    for (name, start, end) in [
        ("Fall 2025", "2025-09-01", "2025-12-20"),
        ("Spring 2026", "2026-01-10", "2026-05-20"),
        ("Summer 2026", "2026-06-01", "2026-08-15"),
    ] {
        let body = json!({ "name": name, "start_date": start, "end_date": end, "is_active": true });
        let (status, semester) =
            send(&app, "POST", "/api/semesters", Some(&admin.token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(semester["id"].as_str().unwrap().parse::<Uuid>().unwrap());
        assert_eq!(active_semesters(&pool).await.len(), 1);
    }

    let uri = format!("/api/semesters/{}/activate", ids[0]);
    let (status, _) = send(&app, "POST", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active_semesters(&pool).await, vec![ids[0]]);

    let (status, active) = send(&app, "GET", "/api/semesters/active", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["name"], "Fall 2025");

    let uri = format!("/api/semesters/{}", ids[0]);
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_semester_rejects_inverted_dates(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let app = setup_test_app(pool);

    let body = json!({ "name": "Backwards", "start_date": "2026-05-01", "end_date": "2026-01-01" });
    let (status, _) = send(&app, "POST", "/api/semesters", Some(&admin.token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grade_requires_active_semester(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let student = create_test_user(&pool, "stu", "student").await;
    let dept = create_department(&pool, "CS").await;
    let course = create_course(&pool, "CS1", 3, dept, None).await;
    let app = setup_test_app(pool);

    let body = json!({
        "student_id": student.student_id.unwrap(),
        "course_id": course,
        "score": 88.0
    });
    let (status, _) = send(&app, "POST", "/api/grades", Some(&admin.token), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grade_writes_recompute_gpa(pool: PgPool) {
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let student = create_test_user(&pool, "stu", "student").await;
    let dept = create_department(&pool, "CS").await;
    let intro = create_course(&pool, "CS1", 3, dept, teacher.teacher_id).await;
    let systems = create_course(&pool, "CS2", 4, dept, teacher.teacher_id).await;
    let semester = create_semester(&pool, "Fall", true).await;
    enroll(&pool, student.student_id.unwrap(), intro, semester).await;
    enroll(&pool, student.student_id.unwrap(), systems, semester).await;
    let app = setup_test_app(pool.clone());

    for (course, score) in [(intro, 95.0), (systems, 50.0)] {
        let body = json!({
            "student_id": student.student_id.unwrap(),
            "course_id": course,
            "score": score
        });
        let (status, grade) =
            send(&app, "POST", "/api/grades", Some(&teacher.token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(grade["letter_grade"].is_string());
    }

    let uri = format!("/api/students/{}", student.student_id.unwrap());
    let (_, record) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    // A (4.0 x 3) + F (0.0 x 4) over 7 credits
    assert_eq!(record["gpa"], json!(1.71));
    assert_eq!(record["credits_earned"], 3);

    let duplicate = json!({
        "student_id": student.student_id.unwrap(),
        "course_id": intro,
        "score": 70.0
    });
    let (status, _) = send(&app, "POST", "/api/grades", Some(&teacher.token), Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let admin = create_test_user(&pool, "adm", "admin").await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/courses/{intro}"),
        Some(&admin.token),
        Some(json!({ "credits": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, record) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    // A (4.0 x 4) + F (0.0 x 4) over 8 credits
    assert_eq!(record["gpa"], json!(2.0));
    assert_eq!(record["credits_earned"], 4);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/courses/{systems}"),
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, record) = send(&app, "GET", &uri, Some(&admin.token), None).await;
    assert_eq!(record["gpa"], json!(4.0));
    assert_eq!(record["credits_earned"], 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_capacity_per_semester(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let first = create_test_user(&pool, "stu1", "student").await;
    let second = create_test_user(&pool, "stu2", "student").await;
    let dept = create_department(&pool, "CS").await;
    let course = create_course(&pool, "CS1", 3, dept, None).await;
    sqlx::query("UPDATE courses SET capacity = 1 WHERE id = $1")
        .bind(course)
        .execute(&pool)
        .await
        .unwrap();
    let fall = create_semester(&pool, "Fall", true).await;
    let spring = create_semester(&pool, "Spring", false).await;
    let app = setup_test_app(pool);
    let uri = format!("/api/courses/{course}/enrollments");

    let (status, seat) = send(
        &app,
        "POST",
        &uri,
        Some(&admin.token),
        Some(json!({ "student_id": first.student_id.unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seat["semester_id"], json!(fall));

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&admin.token),
        Some(json!({ "student_id": second.student_id.unwrap(), "semester_id": spring })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let fall_request = json!({ "student_id": second.student_id.unwrap() });
    let (status, _) = send(&app, "POST", &uri, Some(&admin.token), Some(fall_request.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let seat_uri = format!("{uri}/{}", seat["id"].as_str().unwrap());
    let (status, dropped) = send(
        &app,
        "PATCH",
        &seat_uri,
        Some(&admin.token),
        Some(json!({ "status": "dropped" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dropped["status"], "dropped");

    let (status, _) = send(&app, "POST", &uri, Some(&admin.token), Some(fall_request)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "PATCH",
        &seat_uri,
        Some(&first.token),
        Some(json!({ "status": "enrolled" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_cannot_grade_other_courses(pool: PgPool) {
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let student = create_test_user(&pool, "stu", "student").await;
    let dept = create_department(&pool, "CS").await;
    let course = create_course(&pool, "CS1", 3, dept, None).await;
    create_semester(&pool, "Fall", true).await;
    let app = setup_test_app(pool);

    let body = json!({
        "student_id": student.student_id.unwrap(),
        "course_id": course,
        "score": 80.0
    });
    let (status, _) = send(&app, "POST", "/api/grades", Some(&teacher.token), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_document_reset_clears_file_and_review(pool: PgPool) {
    let student = create_test_user(&pool, "stu", "student").await;
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let app = setup_test_app(pool);

    let (status, doc) = send(
        &app,
        "POST",
        "/api/documents",
        Some(&student.token),
        Some(json!({ "title": "Transcript", "document_type": "transcript" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["status"], "pending");
    let id = doc["id"].as_str().unwrap().to_string();

    let (status, doc) = send(
        &app,
        "POST",
        &format!("/api/documents/{id}/upload"),
        Some(&student.token),
        Some(json!({
            "file_name": "transcript.pdf",
            "file_url": "https://files.example.com/transcript.pdf",
            "file_size": 2048,
            "mime_type": "application/pdf"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["status"], "uploaded");

    let (status, doc) = send(
        &app,
        "POST",
        &format!("/api/documents/{id}/review"),
        Some(&teacher.token),
        Some(json!({ "decision": "rejected", "notes": "Illegible" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["status"], "rejected");

    let (status, doc) = send(
        &app,
        "POST",
        &format!("/api/documents/{id}/reset"),
        Some(&student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["status"], "pending");
    for field in ["file_name", "file_url", "file_size", "mime_type", "uploaded_at", "reviewed_by", "reviewed_at", "review_notes"] {
        assert!(doc[field].is_null(), "{field} should be cleared");
    }

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/documents/{id}/review"),
        Some(&teacher.token),
        Some(json!({ "decision": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_cannot_create_document_for_someone_else(pool: PgPool) {
    let student = create_test_user(&pool, "stu", "student").await;
    let other = create_test_user(&pool, "other", "student").await;
    let app = setup_test_app(pool);

    let body = json!({
        "student_id": other.student_id.unwrap(),
        "title": "Transcript",
        "document_type": "transcript"
    });
    let (status, _) = send(&app, "POST", "/api/documents", Some(&student.token), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_recommendation_submit_once(pool: PgPool) {
    let student = create_test_user(&pool, "stu", "student").await;
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let other_teacher = create_test_user(&pool, "tch2", "teacher").await;
    let app = setup_test_app(pool);

    let deadline = (chrono::Utc::now().date_naive() + chrono::Duration::days(30)).to_string();
    let (status, rec) = send(
        &app,
        "POST",
        "/api/recommendations",
        Some(&student.token),
        Some(json!({
            "teacher_id": teacher.teacher_id.unwrap(),
            "purpose": "Graduate school",
            "deadline": deadline
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = rec["id"].as_str().unwrap().to_string();

    let submit = json!({ "content": "An excellent student." });
    let uri = format!("/api/recommendations/{id}/submit");

    let (status, _) = send(&app, "POST", &uri, Some(&other_teacher.token), Some(submit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rec) = send(&app, "POST", &uri, Some(&teacher.token), Some(submit.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rec["status"], "submitted");

    let (status, _) = send(&app, "POST", &uri, Some(&teacher.token), Some(submit)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/recommendations/{id}"),
        Some(&student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_recommendation_rejects_past_deadline(pool: PgPool) {
    let student = create_test_user(&pool, "stu", "student").await;
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/recommendations",
        Some(&student.token),
        Some(json!({
            "teacher_id": teacher.teacher_id.unwrap(),
            "purpose": "Internship",
            "deadline": "2000-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_dashboards_and_reports(pool: PgPool) {
    let admin = create_test_user(&pool, "adm", "admin").await;
    let teacher = create_test_user(&pool, "tch", "teacher").await;
    let student = create_test_user(&pool, "stu", "student").await;
    let parent = create_test_user(&pool, "par", "parent").await;
    let dept = create_department(&pool, "CS").await;
    let course = create_course(&pool, "CS1", 3, dept, teacher.teacher_id).await;
    let semester = create_semester(&pool, "Fall", true).await;
    enroll(&pool, student.student_id.unwrap(), course, semester).await;
    link_parent(&pool, parent.id, student.student_id.unwrap()).await;
    let app = setup_test_app(pool);

    let body = json!({
        "student_id": student.student_id.unwrap(),
        "course_id": course,
        "score": 64.0
    });
    let (status, _) = send(&app, "POST", "/api/grades", Some(&teacher.token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dash) = send(&app, "GET", "/api/dashboard/admin", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["total_students"], 1);
    assert_eq!(dash["average_score"], json!(64.0));
    assert_eq!(dash["enrollment_trend"].as_array().unwrap().len(), 6);

    let (status, dash) = send(&app, "GET", "/api/dashboard/teacher", Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["courses"][0]["code"], "CS1");
    assert_eq!(dash["at_risk_students"].as_array().unwrap().len(), 1);

    let (status, dash) = send(&app, "GET", "/api/dashboard/student", Some(&student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["enrolled_courses"], 1);
    assert_eq!(dash["recent_grades"].as_array().unwrap().len(), 1);

    let (status, dash) = send(&app, "GET", "/api/dashboard/parent", Some(&parent.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["children"].as_array().unwrap().len(), 1);

    let uri = format!("/api/reports/grades?course_id={course}");
    let (status, report) = send(&app, "GET", &uri, Some(&teacher.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["graded_count"], 1);
    assert_eq!(report["pass_rate"], json!(100.0));
    assert_eq!(report["distribution"]["D"], 1);

    let (status, trend) = send(
        &app,
        "GET",
        "/api/reports/enrollment-trend?months=3",
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trend["points"].as_array().unwrap().len(), 3);
    assert_eq!(trend["total"], 1);
}
