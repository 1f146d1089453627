use crate::docs::ApiDoc;
use crate::middleware::auth::require_session;
use crate::modules::courses::init_courses_router;
use crate::modules::dashboard::init_dashboard_router;
use crate::modules::departments::init_departments_router;
use crate::modules::documents::init_documents_router;
use crate::modules::grades::init_grades_router;
use crate::modules::me::init_me_router;
use crate::modules::parents::init_parents_router;
use crate::modules::recommendations::init_recommendations_router;
use crate::modules::reports::init_reports_router;
use crate::modules::semesters::init_semesters_router;
use crate::modules::students::init_students_router;
use crate::modules::teachers::init_teachers_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;
use crate::utils::response::HealthResponse;
use axum::http::{HeaderValue, Method};
use axum::{Json, Router, middleware, routing::get};
use registrar_core::AppError;
use registrar_observability::{logging_middleware, metrics_middleware, metrics_router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

#[utoipa::path(
    get,
    path = "/api/health",
    summary = "Health check",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn api_not_found() -> AppError {
    AppError::not_found(anyhow::anyhow!("Route not found"))
}

/// Every `/api` route except the health check sits behind the session layer.
fn api_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/me", init_me_router())
        .nest("/users", init_users_router())
        .nest("/departments", init_departments_router())
        .nest("/semesters", init_semesters_router())
        .nest("/students", init_students_router())
        .nest("/teachers", init_teachers_router())
        .nest("/courses", init_courses_router())
        .nest("/grades", init_grades_router())
        .nest("/documents", init_documents_router())
        .nest("/recommendations", init_recommendations_router())
        .nest("/parents", init_parents_router())
        .nest("/dashboard", init_dashboard_router())
        .nest("/reports", init_reports_router())
        .fallback(api_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
}

pub fn init_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api_router(&state));

    if let Some(metrics) = metrics_router() {
        router = router.merge(metrics);
    }

    router
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
