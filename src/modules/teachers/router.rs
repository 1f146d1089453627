use crate::modules::teachers::controller::{get_teacher, list_teachers, update_teacher};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers))
        .route("/{id}", get(get_teacher).put(update_teacher))
}
