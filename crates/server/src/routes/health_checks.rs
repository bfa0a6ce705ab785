use axum::{extract::State, Json};
use tracing::info;

use service::health::domain::ProbeOutcome;
use service::pool::domain::HealthState;

use crate::errors::JsonApiError;
use crate::routes::ServerState;

#[utoipa::path(
    post, path = "/admin/health-checks", tag = "health",
    responses((status = 200, description = "Probe outcomes"))
)]
pub async fn run_health_checks(State(state): State<ServerState>) -> Result<Json<Vec<ProbeOutcome>>, JsonApiError> {
    let outcomes = state.health.perform_health_checks().await?;
    let unhealthy = outcomes.iter().filter(|o| o.status != HealthState::Healthy).count();
    info!(probed = outcomes.len(), unhealthy, "health checks complete");
    Ok(Json(outcomes))
}
