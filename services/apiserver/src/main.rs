//! Role binding enumeration API server entry point.
//!
//! # Purpose
//! Wires configuration, the binding source, and the HTTP router, then serves
//! until SIGINT/SIGTERM and drains in-flight requests within the configured
//! grace period.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use apiserver::app::{AppState, build_router};
use apiserver::config::ApiServerConfig;
use apiserver::observability::ServiceIdentity;
use apiserver::{observability, source};
use grantscope_rbac::RoleBindingEnumerator;
use std::future::Future;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiServerConfig::from_env_or_yaml().context("load apiserver config")?;
    run_with_shutdown(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run_with_shutdown<F>(config: ApiServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&config)?;
    let metrics_handle = observability::init_observability(&ServiceIdentity {
        backend: state.enumerator.backend_name(),
        bind_addr: config.bind_addr,
        metrics_bind: config.metrics_bind,
    });
    let app = build_router(state.clone());
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));
    tracing::info!(
        %addr,
        backend = state.enumerator.backend_name(),
        "apiserver listening"
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });
    tokio::pin!(shutdown);

    let result = tokio::select! {
        joined = &mut server => {
            metrics_task.abort();
            return Ok(joined.context("server task")??);
        }
        _ = &mut shutdown => {
            tracing::info!("shutting down HTTP server");
            let _ = stop_tx.send(());
            match tokio::time::timeout(config.shutdown_grace, &mut server).await {
                Ok(joined) => joined.context("server task")?.map_err(anyhow::Error::from),
                Err(_) => {
                    tracing::warn!(
                        grace_ms = config.shutdown_grace.as_millis() as u64,
                        "grace period elapsed; aborting in-flight requests"
                    );
                    server.abort();
                    Ok(())
                }
            }
        }
    };

    metrics_task.abort();
    let _ = metrics_task.await;
    tracing::info!("server shut down");
    observability::shutdown_tracing();
    result
}

fn build_state(config: &ApiServerConfig) -> anyhow::Result<AppState> {
    let source = source::build_source(config)?;
    Ok(AppState {
        enumerator: RoleBindingEnumerator::new(source),
    })
}
