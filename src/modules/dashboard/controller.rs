use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use registrar_core::AppError;
use registrar_models::dashboard::{
    AdminDashboard, ParentDashboard, StudentDashboard, TeacherDashboard,
};

use crate::middleware::role::{RequireAdmin, RequireParent, RequireStudent, RequireTeacher};
use crate::modules::dashboard::service::DashboardService;
use crate::state::AppState;

/// Institution-wide overview
///
/// Headcounts, student status breakdown, grade statistics, document backlog
/// and the enrollment trend for the last six months.
#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    summary = "Admin dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin), fields(user_id = %admin.id()))]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminDashboard>, AppError> {
    let dashboard =
        DashboardService::admin(&state.db, &state.academic_config, Utc::now().date_naive())
            .await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/teacher",
    summary = "Teacher dashboard",
    responses(
        (status = 200, description = "Courses, statistics and at-risk students", body = TeacherDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires teacher role")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn teacher_dashboard(
    State(state): State<AppState>,
    RequireTeacher(current): RequireTeacher,
) -> Result<Json<TeacherDashboard>, AppError> {
    let dashboard =
        DashboardService::teacher(&state.db, current.teacher_id()?, &state.academic_config)
            .await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/student",
    summary = "Student dashboard",
    responses(
        (status = 200, description = "Progress, documents and recent grades", body = StudentDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires student role")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn student_dashboard(
    State(state): State<AppState>,
    RequireStudent(current): RequireStudent,
) -> Result<Json<StudentDashboard>, AppError> {
    let dashboard =
        DashboardService::student(&state.db, current.student_id()?, Utc::now().date_naive())
            .await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/parent",
    summary = "Parent dashboard",
    responses(
        (status = 200, description = "Overview of each linked child", body = ParentDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires parent role")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn parent_dashboard(
    State(state): State<AppState>,
    RequireParent(current): RequireParent,
) -> Result<Json<ParentDashboard>, AppError> {
    let dashboard = DashboardService::parent(&state.db, current.id()).await?;
    Ok(Json(dashboard))
}
