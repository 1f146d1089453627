use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::is_observability_enabled;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

fn install_recorder() -> Option<PrometheusHandle> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .and_then(|b| b.install_recorder());

    let handle = match builder {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            return None;
        }
    };

    if let Ok(runtime) = tokio::runtime::Handle::try_current() {
        let upkeep = handle.clone();
        runtime.spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(5)).await;
                upkeep.run_upkeep();
            }
        });
    }

    Some(handle)
}

/// Installs the Prometheus recorder once per process and returns the
/// `/metrics` route, or `None` when observability is off.
pub fn metrics_router<S>() -> Option<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    if !is_observability_enabled() {
        return None;
    }
    let handle = PROMETHEUS.get_or_init(install_recorder).clone()?;
    Some(Router::new().route("/metrics", get(move || async move { handle.render() })))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

// Business counters

/// 401/403 outcomes of session resolution.
pub fn track_session_rejected(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("session_rejections_total", "reason" => reason.to_string()).increment(1);
}

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_grade_recorded(action: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("grades_recorded_total", "action" => action.to_string()).increment(1);
}

pub fn track_document_transition(from: &str, to: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("document_transitions_total", "from" => from.to_string(), "to" => to.to_string())
        .increment(1);
}

pub fn track_semester_activated() {
    if !is_observability_enabled() {
        return;
    }
    counter!("semester_activations_total").increment(1);
}

pub fn track_recommendation_decision(decision: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("recommendation_decisions_total", "decision" => decision.to_string()).increment(1);
}
