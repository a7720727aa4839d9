//! API server entry point.

use api::config::Config;
use catalog::InMemoryCatalog;
use ledger::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::QrisGateway;
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

async fn serve<S>(store: S, config: Config, metrics_handle: PrometheusHandle)
where
    S: OrderStore + Clone + 'static,
{
    let gateway = match config.gateway_base_url.as_deref() {
        Some(base_url) => QrisGateway::with_base_url(config.gateway_api_key.as_str(), base_url),
        None => QrisGateway::new(config.gateway_api_key.as_str()),
    };

    let state = api::create_state(store, InMemoryCatalog::new(), gateway, &config);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration; missing payment secrets abort startup.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 4. Pick the order store: PostgreSQL when DATABASE_URL is set, the
    //    in-memory ledger otherwise.
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::PgPool::connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresOrderStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL order store");
            serve(store, config, metrics_handle).await;
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using in-memory order store");
            serve(InMemoryOrderStore::new(), config, metrics_handle).await;
        }
    }
}
