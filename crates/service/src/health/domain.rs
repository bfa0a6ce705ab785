use serde::Serialize;
use uuid::Uuid;

use crate::pool::domain::HealthState;

/// Outcome of one credential probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub credential_id: Uuid,
    pub name: String,
    pub status: HealthState,
    pub latency_ms: u64,
    pub detail: Option<String>,
}
