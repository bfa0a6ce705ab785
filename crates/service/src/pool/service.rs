use std::sync::Arc;

use models::credential;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{is_allocatable, ResourceKind};
use super::repository::PoolRepository;
use crate::errors::PoolError;
use crate::observability::CAPACITY_EXHAUSTED_TOTAL;

/// Ordered allocation strategies. Each either yields a credential or defers
/// to the next; least-loaded is the guaranteed-terminating fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    /// Keep the agent where it already is, if that credential is still usable.
    CurrentAssignment,
    /// Reuse a credential already serving another agent of the same owner.
    OwnerAffinity,
    /// Least-loaded eligible credential in the pool.
    LeastLoaded,
}

impl std::fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AllocationStrategy::CurrentAssignment => "current_assignment",
            AllocationStrategy::OwnerAffinity => "owner_affinity",
            AllocationStrategy::LeastLoaded => "least_loaded",
        };
        f.write_str(s)
    }
}

const STRATEGY_CHAIN: [AllocationStrategy; 3] = [
    AllocationStrategy::CurrentAssignment,
    AllocationStrategy::OwnerAffinity,
    AllocationStrategy::LeastLoaded,
];

/// Read-only credential selection. Never reserves capacity: assignment is
/// recorded through the ledger only after the remote operation succeeds.
pub struct AllocatorService<R: PoolRepository> {
    repo: Arc<R>,
}

impl<R: PoolRepository> AllocatorService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Pick the least-loaded credential with spare capacity.
    ///
    /// Eligible means active, healthy-or-unprobed, not over capacity, and
    /// below its agent threshold. Ties break on lowest assigned user count,
    /// then oldest credential (prefer warmed-up identities).
    #[instrument(skip(self))]
    pub async fn select_credential(&self, exclude: Option<Uuid>) -> Result<credential::Model, PoolError> {
        let mut eligible: Vec<credential::Model> = self
            .repo
            .list_credentials()
            .await?
            .into_iter()
            .filter(|c| is_allocatable(c) && Some(c.id) != exclude)
            .collect();
        if eligible.is_empty() {
            CAPACITY_EXHAUSTED_TOTAL.inc();
            return Err(PoolError::CapacityExhausted);
        }
        eligible.sort_by(|a, b| {
            a.assigned_agent_count
                .cmp(&b.assigned_agent_count)
                .then_with(|| a.assigned_user_count.cmp(&b.assigned_user_count))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        let chosen = eligible.remove(0);
        debug!(
            credential_id = %chosen.id,
            agents = chosen.assigned_agent_count,
            users = chosen.assigned_user_count,
            "selected credential"
        );
        Ok(chosen)
    }

    /// Pick a credential for an agent by walking the strategy chain.
    #[instrument(skip(self))]
    pub async fn allocate_for_agent(&self, agent_id: Uuid) -> Result<credential::Model, PoolError> {
        let agent = self
            .repo
            .get_resource(ResourceKind::Agent, agent_id)
            .await?
            .ok_or_else(|| PoolError::not_found("agent"))?;

        for strategy in STRATEGY_CHAIN {
            let candidate = match strategy {
                AllocationStrategy::CurrentAssignment => match agent.credential_id {
                    // Capacity is irrelevant here: the agent already counts
                    // against this credential.
                    Some(id) => self
                        .repo
                        .get_credential(id)
                        .await?
                        .filter(|c| c.is_active && !c.over_capacity),
                    None => None,
                },
                AllocationStrategy::OwnerAffinity => {
                    let mut found = None;
                    for sibling in self.repo.list_agents_by_owner(agent.owner_id).await? {
                        if sibling.id == agent.id {
                            continue;
                        }
                        if let Some(id) = sibling.credential_id {
                            if let Some(c) = self.repo.get_credential(id).await? {
                                if is_allocatable(&c) {
                                    found = Some(c);
                                    break;
                                }
                            }
                        }
                    }
                    found
                }
                AllocationStrategy::LeastLoaded => match self.select_credential(None).await {
                    Ok(c) => Some(c),
                    Err(PoolError::CapacityExhausted) => None,
                    Err(e) => return Err(e),
                },
            };
            if let Some(chosen) = candidate {
                info!(agent_id = %agent_id, credential_id = %chosen.id, %strategy, "allocated credential for agent");
                return Ok(chosen);
            }
        }
        Err(PoolError::CapacityExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::repository::mock::MockPoolRepository;

    fn allocator(repo: &Arc<MockPoolRepository>) -> AllocatorService<MockPoolRepository> {
        AllocatorService::new(Arc::clone(repo))
    }

    #[tokio::test]
    async fn full_credential_is_skipped() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 2);
        let b = repo.add_credential("b", 2);
        repo.patch_credential(a.id, |c| c.assigned_agent_count = 2);

        let chosen = allocator(&repo).select_credential(None).await.unwrap();
        assert_eq!(chosen.id, b.id);
    }

    #[tokio::test]
    async fn prefers_lowest_agent_count() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        let b = repo.add_credential("b", 10);
        repo.patch_credential(a.id, |c| c.assigned_agent_count = 5);
        repo.patch_credential(b.id, |c| c.assigned_agent_count = 3);

        let chosen = allocator(&repo).select_credential(None).await.unwrap();
        assert_eq!(chosen.id, b.id);
        assert!(chosen.assigned_agent_count < 5);
    }

    #[tokio::test]
    async fn agent_count_tie_breaks_on_user_count_then_age() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        let b = repo.add_credential("b", 10);
        let c = repo.add_credential("c", 10);
        repo.patch_credential(a.id, |m| m.assigned_user_count = 4);
        repo.patch_credential(b.id, |m| m.assigned_user_count = 2);
        repo.patch_credential(c.id, |m| m.assigned_user_count = 2);

        // b and c tie on both counts; b is older
        let chosen = allocator(&repo).select_credential(None).await.unwrap();
        assert_eq!(chosen.id, b.id);
    }

    #[tokio::test]
    async fn excluded_and_unhealthy_credentials_are_ineligible() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        let b = repo.add_credential("b", 10);
        let c = repo.add_credential("c", 10);
        let d = repo.add_credential("d", 10);
        repo.patch_credential(b.id, |m| m.health_status = "unreachable".into());
        repo.patch_credential(c.id, |m| m.is_active = false);

        let chosen = allocator(&repo).select_credential(Some(a.id)).await.unwrap();
        assert_eq!(chosen.id, d.id);
    }

    #[tokio::test]
    async fn over_capacity_flag_blocks_allocation() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        repo.patch_credential(a.id, |m| m.over_capacity = true);

        let res = allocator(&repo).select_credential(None).await;
        assert!(matches!(res, Err(PoolError::CapacityExhausted)));
    }

    #[tokio::test]
    async fn exhausted_pool_is_reported_not_retried() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 1);
        repo.patch_credential(a.id, |c| c.assigned_agent_count = 1);

        let res = allocator(&repo).select_credential(None).await;
        assert!(matches!(res, Err(PoolError::CapacityExhausted)));
    }

    #[tokio::test]
    async fn allocate_keeps_current_assignment_when_usable() {
        let repo = Arc::new(MockPoolRepository::new());
        let current = repo.add_credential("current", 1);
        let _idle = repo.add_credential("idle", 10);
        // current is at threshold, but the agent is already on it
        repo.patch_credential(current.id, |c| c.assigned_agent_count = 1);
        let owner = Uuid::new_v4();
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(current.id), Some("r_1"));

        let chosen = allocator(&repo).allocate_for_agent(agent.id).await.unwrap();
        assert_eq!(chosen.id, current.id);
    }

    #[tokio::test]
    async fn allocate_falls_back_to_owner_affinity() {
        let repo = Arc::new(MockPoolRepository::new());
        let dead = repo.add_credential("dead", 10);
        let shared = repo.add_credential("shared", 10);
        let _idle = repo.add_credential("idle", 10);
        repo.patch_credential(dead.id, |c| c.is_active = false);
        repo.patch_credential(shared.id, |c| c.assigned_agent_count = 3);
        let owner = Uuid::new_v4();
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(dead.id), Some("r_1"));
        repo.add_resource(ResourceKind::Agent, owner, "sibling", Some(shared.id), Some("r_2"));

        // shared is not least-loaded (idle has 0 agents) but owner affinity wins
        let chosen = allocator(&repo).allocate_for_agent(agent.id).await.unwrap();
        assert_eq!(chosen.id, shared.id);
    }

    #[tokio::test]
    async fn allocate_terminates_in_least_loaded() {
        let repo = Arc::new(MockPoolRepository::new());
        let idle = repo.add_credential("idle", 10);
        let busy = repo.add_credential("busy", 10);
        repo.patch_credential(busy.id, |c| c.assigned_agent_count = 7);
        let agent = repo.add_resource(ResourceKind::Agent, Uuid::new_v4(), "bot", None, None);

        let chosen = allocator(&repo).allocate_for_agent(agent.id).await.unwrap();
        assert_eq!(chosen.id, idle.id);
    }
}
