//! API server HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures tracing middleware, and defines the
//! shared application state injected into handlers.
//!
//! # Notes
//! State holds no mutable data; each request gets its own filters and
//! listing, so handlers run concurrently without locking.
use crate::api;
use crate::api::error::request_id_from_headers;
use crate::observability;
use axum::Router;
use grantscope_rbac::RoleBindingEnumerator;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const ENUMERATE_PATH: &str = "/v1/rbac/enumerateBySubjectNames";
pub const HEALTH_PATH: &str = "/healthz";
pub const OPENAPI_PATH: &str = "/v1/openapi.json";

#[derive(Clone, Debug)]
pub struct AppState {
    pub enumerator: RoleBindingEnumerator,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let request_id = request_id_from_headers(request.headers()).unwrap_or_default();
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %request_id
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            ENUMERATE_PATH,
            axum::routing::post(api::enumerate::enumerate_by_subject_names),
        )
        .route(HEALTH_PATH, axum::routing::get(api::system::health))
        .route(OPENAPI_PATH, axum::routing::get(api::openapi::openapi_json))
        .layer(trace_layer)
        .with_state(state)
}
