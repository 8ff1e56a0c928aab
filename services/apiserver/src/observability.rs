//! Telemetry for the API server: log subscriber, trace context, and metrics.
//!
//! Logs always go to stdout through `tracing-subscriber`. Spans are exported
//! over OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, and carry the
//! serving backend and bind addresses as resource attributes. Metrics are
//! recorded into a Prometheus recorder scraped from a separate listener.
use axum::Router;
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Once, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const SERVICE_NAME: &str = "grantscope-apiserver";
pub const METRICS_PATH: &str = "/metrics";
pub const ENUMERATE_REQUESTS_TOTAL: &str = "grantscope_enumerate_requests_total";
pub const ENUMERATE_MATCHED_BINDINGS: &str = "grantscope_enumerate_matched_bindings";

const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const INSTANCE_ID_ENV: &str = "GRANTSCOPE_SERVICE_INSTANCE_ID";

static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();
static PROPAGATOR: Once = Once::new();

/// What this process serves, as reported to the trace backend.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub backend: &'static str,
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
}

impl ServiceIdentity {
    fn resource_attributes(&self) -> Vec<KeyValue> {
        let mut attrs = vec![
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("grantscope.source.backend", self.backend),
            KeyValue::new("grantscope.http.bind", self.bind_addr.to_string()),
            KeyValue::new("grantscope.metrics.bind", self.metrics_bind.to_string()),
        ];
        if let Ok(instance) = std::env::var(INSTANCE_ID_ENV).or_else(|_| std::env::var("HOSTNAME"))
        {
            attrs.push(KeyValue::new("service.instance.id", instance));
        }
        attrs
    }
}

/// Install the subscriber, propagator and metrics recorder once per process.
///
/// Later calls return the handle from the first call.
pub fn init_observability(identity: &ServiceIdentity) -> PrometheusHandle {
    METRICS
        .get_or_init(|| {
            install_propagator();
            init_subscriber(identity);
            let handle = install_metrics_recorder();
            describe_metrics();
            handle
        })
        .clone()
}

/// Flush buffered spans before exit. No-op when OTLP export is off.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(err) = provider.shutdown()
    {
        tracing::warn!(error = %err, "failed to flush spans");
    }
}

fn init_subscriber(identity: &ServiceIdentity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let endpoint = otlp_endpoint(std::env::var(OTLP_ENDPOINT_ENV).ok());
    let provider = endpoint
        .as_ref()
        .and_then(|_| build_tracer_provider(identity));
    let exporting = provider.is_some();
    match provider {
        Some(provider) => {
            let tracer = provider.tracer(SERVICE_NAME);
            let _ = TRACER_PROVIDER.set(provider);
            let _ = registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init();
        }
        None => {
            let _ = registry.try_init();
        }
    }

    match (endpoint, exporting) {
        (Some(endpoint), true) => tracing::info!(%endpoint, "exporting spans over OTLP"),
        (Some(endpoint), false) => {
            tracing::warn!(%endpoint, "OTLP exporter unavailable; spans stay local")
        }
        (None, _) => {}
    }
}

fn otlp_endpoint(value: Option<String>) -> Option<String> {
    value
        .map(|endpoint| endpoint.trim().to_string())
        .filter(|endpoint| !endpoint.is_empty())
}

fn build_tracer_provider(identity: &ServiceIdentity) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(identity.resource_attributes())
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn install_propagator() {
    PROPAGATOR.call_once(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn install_metrics_recorder() -> PrometheusHandle {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(err) => {
            // Another recorder owns the process; serve a detached handle.
            tracing::warn!(error = %err, "failed to install metrics recorder");
            PrometheusBuilder::new().build_recorder().handle()
        }
    }
}

fn describe_metrics() {
    metrics::describe_counter!(
        ENUMERATE_REQUESTS_TOTAL,
        Unit::Count,
        "Enumeration requests by outcome (ok or error code)"
    );
    metrics::describe_histogram!(
        ENUMERATE_MATCHED_BINDINGS,
        Unit::Count,
        "Role bindings returned per successful enumeration"
    );
}

/// Parent context for a request span, taken from W3C `traceparent` headers.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderCarrier(headers)))
}

struct HeaderCarrier<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        METRICS_PATH,
        axum::routing::get(move || async move { handle.render() }),
    )
}

/// Serve `/metrics` on `addr` until the process exits.
pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_metrics_with_listener(handle, listener, std::future::pending()).await
}

async fn serve_metrics_with_listener<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, metrics_router(handle).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
