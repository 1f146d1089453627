use crate::modules::departments::controller::{
    create_department, delete_department, get_department, list_departments, update_department,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_departments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department).get(list_departments))
        .route(
            "/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}
