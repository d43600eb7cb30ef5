//! Leadflow lead ingestion gateway.
//!
//! Loads configuration, connects to PostgreSQL, wires the ingestion
//! pipeline and serves HTTP until SIGINT or SIGTERM.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use leadflow_api::{AppState, Config, PostgresAuthenticator};
use leadflow_core::{storage::Storage, Clock, RealClock};
use leadflow_ingest::{IngestionService, PostgresLeadStorage};
use leadflow_logging::{LogRouter, TracingDiagnostics};
use leadflow_publish::{EventPublisher, SqsTransport};
use leadflow_schema::{FileSchemaLoader, SchemaValidator};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.rust_log);

    info!("Starting Leadflow lead ingestion gateway");
    info!(
        database_url = %config.database_url_masked(),
        host = %config.host,
        port = config.port,
        log_mode = %config.log_mode(),
        leads_queue = %config.aws_sqs_queue_url,
        "Configuration loaded"
    );

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    leadflow_core::storage::migrate(&db_pool).await.context("Failed to run migrations")?;
    info!("Database migrations completed");

    let storage = Storage::new(db_pool.clone());
    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());

    let transport = SqsTransport::new(config.to_transport_config())
        .context("Failed to build queue transport")?;
    let publisher = Arc::new(EventPublisher::new(
        Arc::new(transport),
        config.to_publisher_config(),
        clock.clone(),
    ));
    let logger = LogRouter::new(
        config.log_mode(),
        Arc::new(TracingDiagnostics::new()),
        publisher.clone(),
        clock.clone(),
    );

    let schema_root = config.schema_root();
    if !schema_root.join(&config.lead_schema).is_file() {
        warn!(
            schema_root = %schema_root.display(),
            lead_schema = %config.lead_schema,
            "Lead schema not found; every submission will be rejected"
        );
    }
    let validator = SchemaValidator::new(Arc::new(FileSchemaLoader::new(schema_root)));

    let ingestion = IngestionService::new(
        validator,
        Arc::new(PostgresLeadStorage::new(storage.leads.clone())),
        publisher,
        logger,
        clock.clone(),
        config.lead_schema.clone(),
    );
    let authenticator = Arc::new(PostgresAuthenticator::new(storage.api_keys.clone()));

    let state = AppState::new(ingestion, authenticator, clock);
    let addr = config.parse_server_addr()?;

    leadflow_api::start_server(state, addr, config.request_timeout())
        .await
        .context("HTTP server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Leadflow shutdown complete");
    Ok(())
}

/// Initializes tracing; `RUST_LOG` syntax, falling back to `info`.
fn init_tracing(directives: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .execute(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
