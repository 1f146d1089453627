use crate::modules::me::controller::get_profile;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_me_router() -> Router<AppState> {
    Router::new().route("/", get(get_profile))
}
