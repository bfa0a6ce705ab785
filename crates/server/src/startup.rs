use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::health::service::HealthService;
use service::ledger::service::LedgerService;
use service::migrate::service::{MigrationConfig, MigrationService};
use service::observability;
use service::pool::repo::seaorm::SeaOrmPoolRepository;
use service::pool::service::AllocatorService;
use service::remote::http::HttpVoicePlatform;
use service::retry::service::{RetryQueueConfig, RetryQueueService};

use crate::periodic;
use crate::routes::{self, ServerState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: &configs::AppConfig) -> anyhow::Result<SocketAddr> {
    let host = if cfg.server.host.trim().is_empty() {
        env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
    } else {
        cfg.server.host.clone()
    };
    let port = if cfg.server.port == 0 {
        env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(8081)
    } else {
        cfg.server.port
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

fn build_state(db: sea_orm::DatabaseConnection, pool_cfg: &configs::PoolConfig) -> anyhow::Result<ServerState> {
    let repo = Arc::new(SeaOrmPoolRepository::new(db.clone()));
    let platform = Arc::new(
        HttpVoicePlatform::new(&pool_cfg.platform_base_url, Duration::from_secs(pool_cfg.request_timeout_secs))
            .map_err(|e| anyhow::anyhow!("cannot build platform client: {e}"))?,
    );

    let allocator = Arc::new(AllocatorService::new(Arc::clone(&repo)));
    let ledger = Arc::new(LedgerService::new(Arc::clone(&repo)));
    let migrations = Arc::new(MigrationService::new(
        Arc::clone(&repo),
        Arc::clone(&ledger),
        Arc::clone(&platform),
        MigrationConfig {
            max_attempts: pool_cfg.max_migration_attempts,
            batch_concurrency: pool_cfg.batch_concurrency,
        },
    ));
    let retry = Arc::new(RetryQueueService::new(
        Arc::clone(&repo),
        Arc::clone(&migrations),
        RetryQueueConfig { batch_size: pool_cfg.queue_batch_size },
    ));
    let health = Arc::new(HealthService::new(
        Arc::clone(&repo),
        Arc::clone(&platform),
        Duration::from_secs(pool_cfg.probe_timeout_secs),
    ));

    Ok(ServerState { db, allocator, ledger, migrations, retry, health })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate().unwrap_or_else(|e| {
        info!(error = %e, "no usable config file, falling back to defaults");
        let mut cfg = configs::AppConfig::default();
        cfg.database.normalize_from_env();
        cfg
    });

    // Admin endpoints for healthz/metrics
    common::admin_http::spawn_admin_server("127.0.0.1:9188", observability::encode_metrics);

    // DB connection
    let db = models::db::connect().await?;

    let state = build_state(db, &cfg.pool)?;

    // Scheduled health checks and queue replay
    periodic::spawn_periodic_tasks(&state, &cfg.pool);

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    // Bind and serve
    let addr = load_bind_addr(&cfg)?;
    info!(%addr, "starting credential pool server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
