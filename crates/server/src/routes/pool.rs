use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use service::ledger::domain::{DriftEntry, ReconciledCounts};

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, Serialize)]
pub struct SelectCredentialInput {
    /// Exclude a credential (used when re-assigning away from a source).
    pub exclude_credential_id: Option<Uuid>,
}

#[utoipa::path(
    post, path = "/admin/pool/select", tag = "pool",
    request_body = crate::openapi::SelectCredentialInputDoc,
    responses(
        (status = 200, description = "Credential selected"),
        (status = 409, description = "Capacity Exhausted")
    )
)]
pub async fn select(
    State(state): State<ServerState>,
    Json(input): Json<SelectCredentialInput>,
) -> Result<Json<models::credential::Model>, JsonApiError> {
    let chosen = state.allocator.select_credential(input.exclude_credential_id).await?;
    info!(credential_id = %chosen.id, "allocator selected credential");
    Ok(Json(chosen))
}

#[utoipa::path(
    post, path = "/admin/pool/agents/{id}/allocate", tag = "pool",
    params(("id" = Uuid, Path, description = "Agent ID")),
    responses(
        (status = 200, description = "Credential allocated"),
        (status = 404, description = "Agent Not Found"),
        (status = 409, description = "Capacity Exhausted")
    )
)]
pub async fn allocate_for_agent(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::credential::Model>, JsonApiError> {
    let chosen = state.allocator.allocate_for_agent(id).await?;
    info!(agent_id = %id, credential_id = %chosen.id, "allocated credential for agent");
    Ok(Json(chosen))
}

#[utoipa::path(
    get, path = "/admin/pool/drift", tag = "pool",
    responses((status = 200, description = "Drift report"))
)]
pub async fn drift_report(State(state): State<ServerState>) -> Result<Json<Vec<DriftEntry>>, JsonApiError> {
    let report = state.ledger.system_wide_drift_report().await?;
    let drifted = report.iter().filter(|e| e.needs_migration).count();
    info!(connections = report.len(), drifted, "drift report generated");
    Ok(Json(report))
}

#[utoipa::path(
    post, path = "/admin/pool/reconcile", tag = "pool",
    responses((status = 200, description = "Counters reconciled"))
)]
pub async fn reconcile(State(state): State<ServerState>) -> Result<Json<Vec<ReconciledCounts>>, JsonApiError> {
    let counts = state.ledger.recalculate_counts().await?;
    info!(credentials = counts.len(), "counters reconciled");
    Ok(Json(counts))
}
