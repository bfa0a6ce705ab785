use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use axum::http::StatusCode;
use service::migrate::domain::{BatchSummary, MigrateOptions, MigrationOutcome};
use service::pool::domain::ResourceKind;
use service::retry::domain::QueueStatus;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, Serialize)]
pub struct MigrateResourceInput {
    /// "agent", "phone_number" or "voice"
    pub resource_kind: String,
    pub resource_id: Uuid,
    pub dest_credential_id: Uuid,
    #[serde(default)]
    pub dry_run: bool,
}

#[utoipa::path(
    post, path = "/admin/migrations/resource", tag = "migrations",
    request_body = crate::openapi::MigrateResourceInputDoc,
    responses(
        (status = 200, description = "Migration outcome"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Capacity Exhausted"),
        (status = 502, description = "Remote Platform Error")
    )
)]
pub async fn migrate_resource(
    State(state): State<ServerState>,
    Json(input): Json<MigrateResourceInput>,
) -> Result<Json<MigrationOutcome>, JsonApiError> {
    let kind = ResourceKind::parse(&input.resource_kind).ok_or_else(|| {
        JsonApiError::new(
            StatusCode::BAD_REQUEST,
            "Validation Error",
            Some(format!("unknown resource kind: {}", input.resource_kind)),
        )
    })?;
    let outcome = state
        .migrations
        .migrate_resource(kind, input.resource_id, input.dest_credential_id, MigrateOptions { dry_run: input.dry_run })
        .await?;
    info!(
        resource_id = %input.resource_id,
        dest = %input.dest_credential_id,
        dry_run = input.dry_run,
        outcome = outcome.label(),
        "migrate resource"
    );
    Ok(Json(outcome))
}

#[utoipa::path(
    post, path = "/admin/migrations/mismatched", tag = "migrations",
    responses((status = 200, description = "Batch summary"))
)]
pub async fn migrate_all_mismatched(State(state): State<ServerState>) -> Result<Json<BatchSummary>, JsonApiError> {
    let summary = state.migrations.migrate_all_mismatched().await?;
    info!(total = summary.total, succeeded = summary.succeeded, failed = summary.failed, "migrate all mismatched");
    Ok(Json(summary))
}

#[utoipa::path(
    post, path = "/admin/migrations/agents/{id}/phone-numbers", tag = "migrations",
    params(("id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Batch summary"),
        (status = 404, description = "Agent Not Found")
    )
)]
pub async fn migrate_agent_phone_numbers(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchSummary>, JsonApiError> {
    let summary = state.migrations.migrate_agent_phone_numbers(id).await?;
    info!(agent_id = %id, total = summary.total, failed = summary.failed, "migrate agent phone numbers");
    Ok(Json(summary))
}

#[utoipa::path(
    get, path = "/admin/migrations/queue", tag = "migrations",
    responses((status = 200, description = "Queue status"))
)]
pub async fn queue_status(State(state): State<ServerState>) -> Result<Json<QueueStatus>, JsonApiError> {
    Ok(Json(state.retry.status().await?))
}

#[utoipa::path(
    post, path = "/admin/migrations/queue/process", tag = "migrations",
    responses((status = 200, description = "Replay summary"))
)]
pub async fn process_queue(State(state): State<ServerState>) -> Result<Json<BatchSummary>, JsonApiError> {
    let summary = state.retry.process_queue().await?;
    info!(total = summary.total, succeeded = summary.succeeded, "retry queue replayed");
    Ok(Json(summary))
}
