use serde::Serialize;

use crate::pool::domain::AttemptCounts;

/// Queue health snapshot. `oldest_failed_age_secs` drives "queue is backing
/// up" alerting.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub counts: AttemptCounts,
    pub oldest_failed_age_secs: Option<i64>,
}
