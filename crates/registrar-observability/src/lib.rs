//! Registrar Observability
//!
//! Tracing subscriber setup, HTTP request logging, and Prometheus metrics.
//!
//! Compile-time switch: the `observability` feature (default). Without it
//! the crate exports no-op stubs with the same signatures and a plain
//! console subscriber. Runtime switch: `OBSERVABILITY_ENABLED=false`
//! keeps the console subscriber and turns every metric into a no-op.

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

use std::sync::OnceLock;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Runtime switch read once from `OBSERVABILITY_ENABLED` (default on).
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true)
    })
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging() -> anyhow::Result<()> {
    #[cfg(feature = "observability")]
    if is_observability_enabled() {
        return logging::init_tracing();
    }
    basic_logging::init_basic_console_logging();
    Ok(())
}

#[cfg(feature = "observability")]
pub use logging::{logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    metrics_middleware, metrics_router, track_document_transition, track_grade_recorded,
    track_recommendation_decision, track_semester_activated, track_session_rejected,
    track_user_created,
};

#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn metrics_router<S>() -> Option<Router<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        None
    }

    pub async fn shutdown_tracer() {}

    pub fn track_session_rejected(_reason: &str) {}
    pub fn track_user_created(_role: &str) {}
    pub fn track_grade_recorded(_action: &str) {}
    pub fn track_document_transition(_from: &str, _to: &str) {}
    pub fn track_semester_activated() {}
    pub fn track_recommendation_decision(_decision: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
