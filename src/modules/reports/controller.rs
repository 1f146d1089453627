use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use registrar_core::AppError;
use registrar_models::dashboard::{EnrollmentTrendReport, TrendParams};
use registrar_models::grades::{GradeReport, GradeReportParams};

use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::reports::service::ReportService;
use crate::state::AppState;
use crate::utils::access::{ensure_teaches_course, record_scope};
use crate::validator::ApiQuery;

/// Grade statistics
///
/// Teachers only see grades from their own courses; naming another
/// teacher's course is forbidden.
#[utoipa::path(
    get,
    path = "/api/reports/grades",
    summary = "Grade report",
    params(GradeReportParams),
    responses(
        (status = 200, description = "Average, pass rate and letter distribution", body = GradeReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires teacher or admin role"),
        (status = 404, description = "Course not found")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn grade_report(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ApiQuery(params): ApiQuery<GradeReportParams>,
) -> Result<Json<GradeReport>, AppError> {
    if let Some(course_id) = params.course_id {
        ensure_teaches_course(&state.db, &current, course_id).await?;
    }

    let scope = record_scope(&state.db, &current).await?;
    let report =
        ReportService::grade_report(&state.db, &scope, &params, &state.academic_config).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/enrollment-trend",
    summary = "Enrollment trend",
    params(TrendParams),
    responses(
        (status = 200, description = "Enrollments per month, oldest first", body = EnrollmentTrendReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role")
    ),
    tag = "Reports",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn enrollment_trend_report(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(params): ApiQuery<TrendParams>,
) -> Result<Json<EnrollmentTrendReport>, AppError> {
    let report =
        ReportService::enrollment_trend(&state.db, params.months(), Utc::now().date_naive())
            .await?;
    Ok(Json(report))
}
