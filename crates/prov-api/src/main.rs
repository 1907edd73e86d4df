// Provisioning orchestrator API server

mod submissions;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use prov_durable::{PostgresWorkflowEventStore, WorkerPool, WorkerPoolConfig, WorkflowExecutor};
use prov_storage::{EncryptionService, FileStateStore, PostgresSubmissionStore};
use prov_worker::engine::{ProvisioningWorkflow, STATE_SNAPSHOT_ACTIVITY_TYPE};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prov_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        tracing::info!("loaded .env from {:?}", path);
    }

    tracing::info!("prov-api starting...");

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("connected to database");

    sqlx::migrate!("../prov-storage/migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database migrations applied");

    let snapshot_dir = std::env::var("SNAPSHOT_DIR").unwrap_or_else(|_| "./snapshots".to_string());
    let snapshots: Arc<dyn prov_storage::StateStore> = Arc::new(FileStateStore::new(snapshot_dir));
    let submissions: Arc<dyn prov_storage::SubmissionStore> =
        Arc::new(PostgresSubmissionStore::new(pool.clone()));

    // Unlike everruns-api's optional API-key encryption, this service can't
    // gracefully degrade: the http/vault adapters need a working encryption
    // service to decrypt credential material on every run.
    let encryption = EncryptionService::from_env().context("failed to initialize encryption service")?;
    tracing::info!("encryption service initialized");

    let registry = Arc::new(
        prov_worker::build_executor_registry(encryption)
            .context("failed to build executor registry")?,
    );

    let mut executor = WorkflowExecutor::new(PostgresWorkflowEventStore::new(pool.clone()));
    executor.register::<ProvisioningWorkflow>();
    let executor = Arc::new(executor);

    let pool_store: Arc<dyn prov_durable::WorkflowEventStore> =
        Arc::new(PostgresWorkflowEventStore::new(pool.clone()));

    let mut activity_types: Vec<String> = registry.executor_names().map(str::to_string).collect();
    activity_types.push(STATE_SNAPSHOT_ACTIVITY_TYPE.to_string());

    let worker_pool = WorkerPool::new(pool_store, WorkerPoolConfig::new(activity_types));
    prov_worker::runtime::register_activities(
        &worker_pool,
        Arc::clone(&executor),
        Arc::clone(&registry),
        Arc::clone(&submissions),
        Arc::clone(&snapshots),
    );
    worker_pool
        .start()
        .await
        .context("failed to start worker pool")?;
    tracing::info!("worker pool started");

    let submissions_state = submissions::AppState {
        executor,
        registry,
        submissions,
        snapshots,
    };

    let app = Router::new()
        .route("/health", get(health))
        .merge(submissions::routes(submissions_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:9100".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind to address")?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
