use crate::modules::dashboard::controller::{
    admin_dashboard, parent_dashboard, student_dashboard, teacher_dashboard,
};
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_dashboard))
        .route("/teacher", get(teacher_dashboard))
        .route("/student", get(student_dashboard))
        .route("/parent", get(parent_dashboard))
}
