use crate::modules::grades::controller::{create_grade, delete_grade, list_grades, update_grade};
use crate::state::AppState;
use axum::{
    Router,
    routing::{post, put},
};

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grade).get(list_grades))
        .route("/{id}", put(update_grade).delete(delete_grade))
}
