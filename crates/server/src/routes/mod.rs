use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::health::service::HealthService;
use service::ledger::service::LedgerService;
use service::migrate::service::MigrationService;
use service::pool::repo::seaorm::SeaOrmPoolRepository;
use service::pool::service::AllocatorService;
use service::remote::http::HttpVoicePlatform;
use service::retry::service::RetryQueueService;

use crate::openapi::ApiDoc;

pub mod credentials;
pub mod pool;
pub mod migrations;
pub mod health_checks;

pub type AppRepository = SeaOrmPoolRepository;
pub type AppPlatform = HttpVoicePlatform;

/// Shared state for all admin handlers.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub allocator: Arc<AllocatorService<AppRepository>>,
    pub ledger: Arc<LedgerService<AppRepository>>,
    pub migrations: Arc<MigrationService<AppRepository, AppPlatform>>,
    pub retry: Arc<RetryQueueService<AppRepository, AppPlatform>>,
    pub health: Arc<HealthService<AppRepository, AppPlatform>>,
}

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service healthy"))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full admin router.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let admin = Router::new()
        .route(
            "/admin/credentials",
            get(credentials::list).post(credentials::create),
        )
        .route(
            "/admin/credentials/:id",
            get(credentials::get)
                .put(credentials::update)
                .delete(credentials::delete),
        )
        .route("/admin/pool/select", post(pool::select))
        .route("/admin/pool/agents/:id/allocate", post(pool::allocate_for_agent))
        .route("/admin/pool/drift", get(pool::drift_report))
        .route("/admin/pool/reconcile", post(pool::reconcile))
        .route("/admin/migrations/resource", post(migrations::migrate_resource))
        .route("/admin/migrations/mismatched", post(migrations::migrate_all_mismatched))
        .route(
            "/admin/migrations/agents/:id/phone-numbers",
            post(migrations::migrate_agent_phone_numbers),
        )
        .route("/admin/migrations/queue", get(migrations::queue_status))
        .route("/admin/migrations/queue/process", post(migrations::process_queue))
        .route("/admin/health-checks", post(health_checks::run_health_checks));

    Router::new()
        .route("/health", get(health))
        .merge(admin)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
