use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use docstore::{DocumentStore, StoreConfig};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod open_telemetry;

use handlers::{records, transactions, users};
use metrics::Metrics;
use models::{Categories, Companies, Employees, Items};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub metrics: Arc<Metrics>,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let port = match std::env::var("API_PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("API_PORT must be a port number, got {raw:?}"))?,
        Err(_) => 8000,
    };

    Ok(Config {
        host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port,
        store: StoreConfig::from_env().context("Invalid document store configuration")?,
    })
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health_handler))
        .route("/test", get(handlers::test_handler))
        .route("/users", post(users::create_user).get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/companies", post(records::create::<Companies>).get(records::list::<Companies>))
        .route(
            "/companies/:id",
            put(records::update::<Companies>).delete(records::delete::<Companies>),
        )
        .route("/employees", post(records::create::<Employees>).get(records::list::<Employees>))
        .route(
            "/employees/:id",
            put(records::update::<Employees>).delete(records::delete::<Employees>),
        )
        .route("/categories", post(records::create::<Categories>).get(records::list::<Categories>))
        .route(
            "/categories/:id",
            put(records::update::<Categories>).delete(records::delete::<Categories>),
        )
        .route("/items", post(records::create::<Items>).get(records::list::<Items>))
        .route(
            "/items/:id",
            put(records::update::<Items>).delete(records::delete::<Items>),
        )
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/transactions/:id/lines",
            get(transactions::list_lines).post(transactions::add_line),
        )
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    open_telemetry::init_tracing().context("Failed to initialize tracing")?;
    let (meter_provider, metrics) =
        metrics::init_metrics().context("Failed to initialize metrics")?;

    info!("Starting FireGloss API...");

    let config = load_config()?;
    let store = Arc::new(DocumentStore::new(config.store.clone()));

    // Strict mode refuses to start without a store; permissive mode serves 503s instead.
    let status = store
        .init()
        .await
        .context("Failed to initialize document store")?;
    info!(%status, mode = %config.store.init_mode, "Document store initialized");

    let state = AppState {
        store: store.clone(),
        metrics: Arc::new(metrics),
    };

    let app = create_app(state);

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .context("Failed to bind port")?;

    info!(addr = %listen_addr, "Listening for requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store, meter_provider))
        .await
        .context("Server error")?;

    opentelemetry::global::shutdown_tracer_provider();

    Ok(())
}

async fn shutdown_signal(
    store: Arc<DocumentStore>,
    meter_provider: opentelemetry_sdk::metrics::SdkMeterProvider,
) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");

    if let Err(e) = store.shutdown().await {
        error!(error = %e, "Failed to close document store");
    }

    if let Err(e) = meter_provider.shutdown() {
        error!(error = %e, "Failed to shutdown meter provider");
    }
}
