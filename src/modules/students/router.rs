use crate::modules::students::controller::{
    get_student, get_student_summary, list_students, update_student,
};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students))
        .route("/{id}", get(get_student).put(update_student))
        .route("/{id}/summary", get(get_student_summary))
}
