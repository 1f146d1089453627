use crate::modules::courses::controller::{
    create_course, delete_course, enroll_student, get_course, list_course_students, list_courses,
    update_course, update_enrollment_status,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(list_courses))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/{id}/enrollments", post(enroll_student))
        .route(
            "/{id}/enrollments/{enrollment_id}",
            patch(update_enrollment_status),
        )
        .route("/{id}/students", get(list_course_students))
}
