use crate::modules::semesters::controller::{
    activate_semester, create_semester, delete_semester, get_active_semester, list_semesters,
    update_semester,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn init_semesters_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_semester).get(list_semesters))
        .route("/active", get(get_active_semester))
        .route("/{id}", put(update_semester).delete(delete_semester))
        .route("/{id}/activate", post(activate_semester))
}
