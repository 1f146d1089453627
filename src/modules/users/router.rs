use crate::modules::users::controller::{
    create_user, delete_user, get_user, list_users, update_user_status,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", get(get_user).delete(delete_user))
        .route("/{id}/status", patch(update_user_status))
}
