use crate::modules::parents::controller::{link_child, list_my_children, unlink_child};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn init_parents_router() -> Router<AppState> {
    Router::new()
        .route("/me/children", get(list_my_children))
        .route("/{parent_id}/children", post(link_child))
        .route("/{parent_id}/children/{student_id}", delete(unlink_child))
}
