use models::credential;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of tenant-owned resource registered against a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Agent,
    PhoneNumber,
    Voice,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Agent => "agent",
            ResourceKind::PhoneNumber => "phone_number",
            ResourceKind::Voice => "voice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(ResourceKind::Agent),
            "phone_number" => Some(ResourceKind::PhoneNumber),
            "voice" => Some(ResourceKind::Voice),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-agnostic view of a resource row, used by the allocator, ledger and
/// migration engine. `label` is the agent name, E.164 number or voice name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub id: Uuid,
    pub owner_id: Uuid,
    pub label: String,
    pub remote_id: Option<String>,
    pub credential_id: Option<Uuid>,
}

/// Credential health as maintained by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unreachable,
    Unknown,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unreachable => "unreachable",
            HealthState::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "healthy" => HealthState::Healthy,
            "degraded" => HealthState::Degraded,
            "unreachable" => HealthState::Unreachable,
            _ => HealthState::Unknown,
        }
    }
}

/// Migration-attempt counts by status.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AttemptCounts {
    pub pending: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub dead: i64,
}

/// Whether the allocator may hand out this credential. Unknown health is
/// allocatable: a credential that has never been probed should not be
/// penalized.
pub fn is_allocatable(c: &credential::Model) -> bool {
    c.is_active
        && matches!(HealthState::parse(&c.health_status), HealthState::Healthy | HealthState::Unknown)
        && !c.over_capacity
        && c.assigned_agent_count < c.max_agents
}

/// Capacity-only check, re-run at migration execution time.
pub fn has_spare_capacity(c: &credential::Model) -> bool {
    c.is_active && c.assigned_agent_count < c.max_agents
}
