use crate::modules::reports::controller::{enrollment_trend_report, grade_report};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_reports_router() -> Router<AppState> {
    Router::new()
        .route("/grades", get(grade_report))
        .route("/enrollment-trend", get(enrollment_trend_report))
}
