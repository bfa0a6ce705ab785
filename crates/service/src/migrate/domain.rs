use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pool::domain::ResourceKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
    /// Report what would happen without touching the remote platform or the
    /// store.
    pub dry_run: bool,
}

/// What a migration will do (or did): which resource moves where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub resource_label: String,
    pub source_credential_id: Option<Uuid>,
    pub dest_credential_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MigrationOutcome {
    Migrated(MigrationPlan),
    /// No-op guard: the resource already lives on the requested credential.
    AlreadyAssigned { resource_id: Uuid, credential_id: Uuid },
    DryRun(MigrationPlan),
}

impl MigrationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MigrationOutcome::Migrated(_) => "migrated",
            MigrationOutcome::AlreadyAssigned { .. } => "already_assigned",
            MigrationOutcome::DryRun(_) => "dry_run",
        }
    }
}

/// Per-resource result inside a batch. Batches never fail atomically; every
/// resource reports its own outcome.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub resource_kind: String,
    pub resource_id: Uuid,
    pub dest_credential_id: Option<Uuid>,
    pub succeeded: bool,
    pub outcome: String,
    pub error: Option<String>,
}

impl BatchItem {
    pub fn ok(kind: ResourceKind, resource_id: Uuid, dest: Option<Uuid>, outcome: &str) -> Self {
        Self {
            resource_kind: kind.as_str().to_string(),
            resource_id,
            dest_credential_id: dest,
            succeeded: true,
            outcome: outcome.to_string(),
            error: None,
        }
    }

    pub fn failed(kind: ResourceKind, resource_id: Uuid, dest: Option<Uuid>, error: &str) -> Self {
        Self {
            resource_kind: kind.as_str().to_string(),
            resource_id,
            dest_credential_id: dest,
            succeeded: false,
            outcome: "failed".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Structured batch summary; multi-resource operations never return a bare
/// boolean.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub per_item: Vec<BatchItem>,
}

impl BatchSummary {
    pub fn from_items(per_item: Vec<BatchItem>) -> Self {
        let total = per_item.len();
        let succeeded = per_item.iter().filter(|i| i.succeeded).count();
        Self { total, succeeded, failed: total - succeeded, per_item }
    }
}
