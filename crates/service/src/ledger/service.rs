use std::sync::Arc;

use models::connection;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::domain::{DriftEntry, DriftStatus, ReconciledCounts};
use crate::errors::PoolError;
use crate::pool::domain::ResourceKind;
use crate::pool::repository::PoolRepository;

/// Authoritative source of resource-to-credential assignment. Counter
/// increments are an optimization; `recalculate_counts` is ground truth.
pub struct LedgerService<R: PoolRepository> {
    repo: Arc<R>,
}

impl<R: PoolRepository> LedgerService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    /// Idempotent assignment upsert. Moves the resource to `credential_id`,
    /// transferring counters from the prior credential in the same logical
    /// update. `new_remote_id` replaces the stored remote id when given.
    #[instrument(skip(self, new_remote_id))]
    pub async fn record_assignment(
        &self,
        kind: ResourceKind,
        resource_id: Uuid,
        credential_id: Uuid,
        new_remote_id: Option<&str>,
    ) -> Result<(), PoolError> {
        let resource = self
            .repo
            .get_resource(kind, resource_id)
            .await?
            .ok_or_else(|| PoolError::not_found(kind.as_str()))?;
        let prior = resource.credential_id;

        if prior == Some(credential_id) {
            // Re-recording the same assignment only refreshes the remote id.
            if new_remote_id.is_some() {
                self.repo
                    .set_resource_assignment(kind, resource_id, Some(credential_id), new_remote_id.map(str::to_string))
                    .await?;
            }
            return Ok(());
        }

        self.repo
            .get_credential(credential_id)
            .await?
            .ok_or_else(|| PoolError::not_found("credential"))?;

        self.repo
            .set_resource_assignment(kind, resource_id, Some(credential_id), new_remote_id.map(str::to_string))
            .await?;

        if kind == ResourceKind::Agent {
            self.repo.adjust_agent_count(credential_id, 1).await?;
            if let Some(p) = prior {
                self.repo.adjust_agent_count(p, -1).await?;
            }
        }
        // User counters follow the first/last resource of the owner on each
        // credential. Crashes between these updates drift the counters;
        // recalculate_counts repairs them.
        if self.repo.count_owner_resources_on(credential_id, resource.owner_id).await? == 1 {
            self.repo.adjust_user_count(credential_id, 1).await?;
        }
        if let Some(p) = prior {
            if self.repo.count_owner_resources_on(p, resource.owner_id).await? == 0 {
                self.repo.adjust_user_count(p, -1).await?;
            }
        }

        info!(
            kind = %kind,
            resource_id = %resource_id,
            credential_id = %credential_id,
            prior = ?prior,
            "assignment recorded"
        );
        Ok(())
    }

    /// Full reconciliation: recompute every credential's counters from the
    /// resource tables and overwrite the stored values. Safe to run at any
    /// time; this is the designed repair path for counter drift.
    #[instrument(skip(self))]
    pub async fn recalculate_counts(&self) -> Result<Vec<ReconciledCounts>, PoolError> {
        let mut out = Vec::new();
        for cred in self.repo.list_credentials().await? {
            let agents = self.repo.count_agents_on(cred.id).await? as i32;
            let users = self.repo.count_distinct_owners_on(cred.id).await? as i32;
            let over = agents > cred.max_agents;
            if agents != cred.assigned_agent_count || users != cred.assigned_user_count {
                warn!(
                    credential_id = %cred.id,
                    stored_agents = cred.assigned_agent_count,
                    actual_agents = agents,
                    stored_users = cred.assigned_user_count,
                    actual_users = users,
                    "counter drift repaired"
                );
            }
            self.repo.set_counts(cred.id, agents, users, over).await?;
            out.push(ReconciledCounts {
                credential_id: cred.id,
                name: cred.name,
                assigned_agent_count: agents,
                assigned_user_count: users,
                over_capacity: over,
            });
        }
        Ok(out)
    }

    /// Drift check for one connection: flagged iff the agent has a
    /// credential and the phone's differs (or the phone has none).
    pub async fn detect_drift(&self, conn: &connection::Model) -> Result<DriftStatus, PoolError> {
        let phone = self
            .repo
            .get_resource(ResourceKind::PhoneNumber, conn.phone_number_id)
            .await?
            .ok_or_else(|| PoolError::not_found("phone number"))?;
        let agent = self
            .repo
            .get_resource(ResourceKind::Agent, conn.agent_id)
            .await?
            .ok_or_else(|| PoolError::not_found("agent"))?;
        let needs_migration = match agent.credential_id {
            Some(agent_cred) => phone.credential_id != Some(agent_cred),
            None => false,
        };
        Ok(DriftStatus {
            needs_migration,
            phone_credential_id: phone.credential_id,
            agent_credential_id: agent.credential_id,
        })
    }

    /// Drift tuple for every connection, plus unconnected phones (reported,
    /// never flagged).
    #[instrument(skip(self))]
    pub async fn system_wide_drift_report(&self) -> Result<Vec<DriftEntry>, PoolError> {
        let mut entries = Vec::new();
        for conn in self.repo.list_connections().await? {
            let phone = self
                .repo
                .get_resource(ResourceKind::PhoneNumber, conn.phone_number_id)
                .await?
                .ok_or_else(|| PoolError::not_found("phone number"))?;
            let status = self.detect_drift(&conn).await?;
            entries.push(DriftEntry {
                connection_id: Some(conn.id),
                phone_number_id: conn.phone_number_id,
                phone_e164: phone.label,
                agent_id: Some(conn.agent_id),
                connected: true,
                needs_migration: status.needs_migration,
                phone_credential_id: status.phone_credential_id,
                agent_credential_id: status.agent_credential_id,
            });
        }
        for phone in self.repo.list_unconnected_phones().await? {
            entries.push(DriftEntry {
                connection_id: None,
                phone_number_id: phone.id,
                phone_e164: phone.label,
                agent_id: None,
                connected: false,
                needs_migration: false,
                phone_credential_id: phone.credential_id,
                agent_credential_id: None,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::repository::mock::MockPoolRepository;

    fn ledger(repo: &Arc<MockPoolRepository>) -> LedgerService<MockPoolRepository> {
        LedgerService::new(Arc::clone(repo))
    }

    #[tokio::test]
    async fn record_assignment_transfers_counters() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        let b = repo.add_credential("b", 10);
        let owner = Uuid::new_v4();
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(a.id), Some("r_1"));
        repo.patch_credential(a.id, |c| {
            c.assigned_agent_count = 1;
            c.assigned_user_count = 1;
        });

        let svc = ledger(&repo);
        svc.record_assignment(ResourceKind::Agent, agent.id, b.id, Some("r_2")).await.unwrap();

        let a_after = repo.credential_snapshot(a.id).unwrap();
        let b_after = repo.credential_snapshot(b.id).unwrap();
        assert_eq!(a_after.assigned_agent_count, 0);
        assert_eq!(a_after.assigned_user_count, 0);
        assert_eq!(b_after.assigned_agent_count, 1);
        assert_eq!(b_after.assigned_user_count, 1);

        let moved = repo.get_resource(ResourceKind::Agent, agent.id).await.unwrap().unwrap();
        assert_eq!(moved.credential_id, Some(b.id));
        assert_eq!(moved.remote_id.as_deref(), Some("r_2"));
    }

    #[tokio::test]
    async fn record_assignment_is_idempotent() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        let owner = Uuid::new_v4();
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(a.id), Some("r_1"));
        repo.patch_credential(a.id, |c| {
            c.assigned_agent_count = 1;
            c.assigned_user_count = 1;
        });

        let svc = ledger(&repo);
        svc.record_assignment(ResourceKind::Agent, agent.id, a.id, None).await.unwrap();
        svc.record_assignment(ResourceKind::Agent, agent.id, a.id, None).await.unwrap();

        let after = repo.credential_snapshot(a.id).unwrap();
        assert_eq!(after.assigned_agent_count, 1);
        assert_eq!(after.assigned_user_count, 1);
    }

    #[tokio::test]
    async fn recalculate_overwrites_drifted_counters() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 2);
        let b = repo.add_credential("b", 10);
        let owner1 = Uuid::new_v4();
        let owner2 = Uuid::new_v4();
        repo.add_resource(ResourceKind::Agent, owner1, "bot1", Some(a.id), Some("r_1"));
        repo.add_resource(ResourceKind::Agent, owner1, "bot2", Some(a.id), Some("r_2"));
        repo.add_resource(ResourceKind::Agent, owner2, "bot3", Some(a.id), Some("r_3"));
        repo.add_resource(ResourceKind::PhoneNumber, owner2, "+14155550100", Some(b.id), Some("r_4"));
        // counters wildly wrong on purpose
        repo.patch_credential(a.id, |c| {
            c.assigned_agent_count = 99;
            c.assigned_user_count = 0;
        });

        let report = ledger(&repo).recalculate_counts().await.unwrap();

        let a_after = repo.credential_snapshot(a.id).unwrap();
        assert_eq!(a_after.assigned_agent_count, 3);
        assert_eq!(a_after.assigned_user_count, 2);
        // three agents on a two-agent credential: flagged, not auto-shed
        assert!(a_after.over_capacity);

        let b_after = repo.credential_snapshot(b.id).unwrap();
        assert_eq!(b_after.assigned_agent_count, 0);
        assert_eq!(b_after.assigned_user_count, 1);

        let a_row = report.iter().find(|r| r.credential_id == a.id).unwrap();
        assert_eq!(a_row.assigned_agent_count, 3);
    }

    #[tokio::test]
    async fn recalculate_is_idempotent() {
        let repo = Arc::new(MockPoolRepository::new());
        let a = repo.add_credential("a", 10);
        repo.add_resource(ResourceKind::Agent, Uuid::new_v4(), "bot", Some(a.id), Some("r_1"));

        let svc = ledger(&repo);
        let first = svc.recalculate_counts().await.unwrap();
        let second = svc.recalculate_counts().await.unwrap();
        assert_eq!(first[0].assigned_agent_count, second[0].assigned_agent_count);
        assert_eq!(first[0].assigned_user_count, second[0].assigned_user_count);
    }

    #[tokio::test]
    async fn drift_truth_table() {
        let repo = Arc::new(MockPoolRepository::new());
        let x = repo.add_credential("x", 10);
        let y = repo.add_credential("y", 10);
        let owner = Uuid::new_v4();
        let svc = ledger(&repo);

        // same credential: no drift
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(x.id), Some("r_1"));
        let phone = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550101", Some(x.id), Some("r_2"));
        let conn = repo.connect(phone.id, agent.id);
        let status = svc.detect_drift(&conn).await.unwrap();
        assert!(!status.needs_migration);

        // different credentials: drift
        let agent2 = repo.add_resource(ResourceKind::Agent, owner, "bot2", Some(x.id), Some("r_3"));
        let phone2 = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550102", Some(y.id), Some("r_4"));
        let conn2 = repo.connect(phone2.id, agent2.id);
        let status2 = svc.detect_drift(&conn2).await.unwrap();
        assert!(status2.needs_migration);
        assert_eq!(status2.phone_credential_id, Some(y.id));
        assert_eq!(status2.agent_credential_id, Some(x.id));

        // phone unassigned, agent assigned: drift
        let agent3 = repo.add_resource(ResourceKind::Agent, owner, "bot3", Some(x.id), Some("r_5"));
        let phone3 = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550103", None, None);
        let conn3 = repo.connect(phone3.id, agent3.id);
        let status3 = svc.detect_drift(&conn3).await.unwrap();
        assert!(status3.needs_migration);
        assert_eq!(status3.phone_credential_id, None);

        // agent unassigned: nothing to migrate toward
        let agent4 = repo.add_resource(ResourceKind::Agent, owner, "bot4", None, None);
        let phone4 = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550104", Some(y.id), Some("r_6"));
        let conn4 = repo.connect(phone4.id, agent4.id);
        let status4 = svc.detect_drift(&conn4).await.unwrap();
        assert!(!status4.needs_migration);
    }

    #[tokio::test]
    async fn report_includes_unconnected_phones_unflagged() {
        let repo = Arc::new(MockPoolRepository::new());
        let x = repo.add_credential("x", 10);
        let owner = Uuid::new_v4();
        let agent = repo.add_resource(ResourceKind::Agent, owner, "bot", Some(x.id), Some("r_1"));
        let phone = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550105", Some(x.id), Some("r_2"));
        repo.connect(phone.id, agent.id);
        let orphan = repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550106", None, None);

        let report = ledger(&repo).system_wide_drift_report().await.unwrap();
        assert_eq!(report.len(), 2);

        let orphan_row = report.iter().find(|e| e.phone_number_id == orphan.id).unwrap();
        assert!(!orphan_row.connected);
        assert!(!orphan_row.needs_migration);

        let connected_row = report.iter().find(|e| e.phone_number_id == phone.id).unwrap();
        assert!(connected_row.connected);
        assert!(!connected_row.needs_migration);
    }
}
