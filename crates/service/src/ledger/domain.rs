use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Drift verdict for one phone-to-agent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftStatus {
    pub needs_migration: bool,
    pub phone_credential_id: Option<Uuid>,
    pub agent_credential_id: Option<Uuid>,
}

/// One row of the system-wide drift report. Unconnected phones appear with
/// `connected = false` and are never flagged for migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftEntry {
    pub connection_id: Option<Uuid>,
    pub phone_number_id: Uuid,
    pub phone_e164: String,
    pub agent_id: Option<Uuid>,
    pub connected: bool,
    pub needs_migration: bool,
    pub phone_credential_id: Option<Uuid>,
    pub agent_credential_id: Option<Uuid>,
}

/// Post-reconciliation counters for one credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledCounts {
    pub credential_id: Uuid,
    pub name: String,
    pub assigned_agent_count: i32,
    pub assigned_user_count: i32,
    pub over_capacity: bool,
}
