//! Observability server entry point.

use std::sync::Arc;

use api::{AppState, Config};
use event_store::InMemoryEventStore;
use messaging::InMemoryDeadLetterQueue;
use monitor::{ConsistencyMonitor, PaidOrdersHaveCompletedPayments};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let event_store = InMemoryEventStore::new();

    let consistency_monitor = Arc::new(
        ConsistencyMonitor::new()
            .register_check(Arc::new(PaidOrdersHaveCompletedPayments::new(
                event_store.clone(),
            ))),
    );
    tokio::spawn({
        let consistency_monitor = consistency_monitor.clone();
        let period = config.check_interval;
        async move { consistency_monitor.run_on_interval(period).await }
    });

    let state = Arc::new(AppState {
        monitor: consistency_monitor,
        dead_letters: Arc::new(InMemoryDeadLetterQueue::new()),
    });

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting observability server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
