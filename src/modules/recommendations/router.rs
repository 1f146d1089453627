use crate::modules::recommendations::controller::{
    create_recommendation, decline_recommendation, delete_recommendation, list_recommendations,
    submit_recommendation,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, post},
};

pub fn init_recommendations_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_recommendation).get(list_recommendations))
        .route("/{id}", delete(delete_recommendation))
        .route("/{id}/submit", post(submit_recommendation))
        .route("/{id}/decline", post(decline_recommendation))
}
