use std::sync::Arc;

use models::{credential, migration_attempt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::domain::{BatchItem, BatchSummary, MigrateOptions, MigrationOutcome, MigrationPlan};
use crate::errors::PoolError;
use crate::ledger::service::LedgerService;
use crate::observability::{MIGRATIONS_TOTAL, MIGRATION_FAILURES_TOTAL};
use crate::pool::domain::{has_spare_capacity, ResourceKind, ResourceRecord};
use crate::pool::repository::PoolRepository;
use crate::remote::{AgentSpec, PhoneSpec, VoicePlatformClient, VoiceSpec};

const STATUS_SUCCEEDED: &str = "succeeded";
const STATUS_FAILED: &str = "failed";
const STATUS_DEAD: &str = "dead";

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Attempts before an attempt row is abandoned as dead.
    pub max_attempts: u32,
    /// Worker count for batch migrations.
    pub batch_concurrency: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self { max_attempts: 3, batch_concurrency: 5 }
    }
}

/// Moves remote registrations between credentials. Destination-first: a
/// resource must never exist on zero credentials, even transiently, so the
/// source registration survives until the destination create is acknowledged.
pub struct MigrationService<R: PoolRepository, C: VoicePlatformClient> {
    repo: Arc<R>,
    ledger: Arc<LedgerService<R>>,
    platform: Arc<C>,
    cfg: MigrationConfig,
}

impl<R, C> MigrationService<R, C>
where
    R: PoolRepository + 'static,
    C: VoicePlatformClient + 'static,
{
    pub fn new(repo: Arc<R>, ledger: Arc<LedgerService<R>>, platform: Arc<C>, cfg: MigrationConfig) -> Self {
        Self { repo, ledger, platform, cfg }
    }

    pub fn max_attempts(&self) -> i32 {
        self.cfg.max_attempts as i32
    }

    /// Migrate one resource to `dest_credential_id`.
    ///
    /// Capacity is re-validated here, at execution time, because the
    /// credential chosen at selection time may have filled up in between.
    #[instrument(skip(self, opts), fields(dry_run = opts.dry_run))]
    pub async fn migrate_resource(
        &self,
        kind: ResourceKind,
        resource_id: Uuid,
        dest_credential_id: Uuid,
        opts: MigrateOptions,
    ) -> Result<MigrationOutcome, PoolError> {
        let resource = self
            .repo
            .get_resource(kind, resource_id)
            .await?
            .ok_or_else(|| PoolError::not_found(kind.as_str()))?;
        let dest = self
            .repo
            .get_credential(dest_credential_id)
            .await?
            .ok_or_else(|| PoolError::not_found("credential"))?;

        if resource.credential_id == Some(dest.id) {
            return Ok(MigrationOutcome::AlreadyAssigned { resource_id, credential_id: dest.id });
        }
        Self::ensure_dest_usable(kind, &dest)?;

        let plan = MigrationPlan {
            resource_kind: kind,
            resource_id,
            resource_label: resource.label.clone(),
            source_credential_id: resource.credential_id,
            dest_credential_id: dest.id,
        };
        if opts.dry_run {
            info!(resource_id = %resource_id, dest = %dest.id, "dry run, no side effects");
            return Ok(MigrationOutcome::DryRun(plan));
        }

        let attempt = self
            .repo
            .insert_attempt(kind, resource_id, resource.credential_id, dest.id)
            .await?;
        self.run_attempt(resource, dest, attempt).await
    }

    /// Replay a previously failed attempt with the same destination.
    pub async fn retry_attempt(&self, attempt: &migration_attempt::Model) -> Result<MigrationOutcome, PoolError> {
        let kind = ResourceKind::parse(&attempt.resource_kind)
            .ok_or_else(|| PoolError::Validation(format!("unknown resource kind: {}", attempt.resource_kind)))?;

        let resource = match self.repo.get_resource(kind, attempt.resource_id).await? {
            Some(r) => r,
            None => {
                self.repo
                    .update_attempt(attempt.id, STATUS_DEAD, attempt.attempt_count, Some("resource no longer exists".into()))
                    .await?;
                return Err(PoolError::not_found(kind.as_str()));
            }
        };
        let dest = match self.repo.get_credential(attempt.dest_credential_id).await? {
            Some(c) => c,
            None => {
                self.repo
                    .update_attempt(attempt.id, STATUS_DEAD, attempt.attempt_count, Some("destination credential no longer exists".into()))
                    .await?;
                return Err(PoolError::not_found("credential"));
            }
        };

        if resource.credential_id == Some(dest.id) {
            // A newer attempt already landed the resource here.
            self.repo
                .update_attempt(attempt.id, STATUS_SUCCEEDED, attempt.attempt_count, None)
                .await?;
            self.repo.supersede_attempts(kind, resource.id, attempt.id).await?;
            return Ok(MigrationOutcome::AlreadyAssigned { resource_id: resource.id, credential_id: dest.id });
        }

        if let Err(e) = Self::ensure_dest_usable(kind, &dest) {
            self.record_failure(attempt, &e.to_string()).await?;
            return Err(e);
        }
        self.run_attempt(resource, dest, attempt.clone()).await
    }

    /// Drift report, then one migration per mismatched connection. Failures
    /// are isolated per resource; the batch itself always completes.
    #[instrument(skip(self))]
    pub async fn migrate_all_mismatched(self: &Arc<Self>) -> Result<BatchSummary, PoolError> {
        let report = self.ledger().system_wide_drift_report().await?;
        let work: Vec<(Uuid, Option<Uuid>)> = report
            .into_iter()
            .filter(|e| e.needs_migration)
            .map(|e| (e.phone_number_id, e.agent_credential_id))
            .collect();
        info!(mismatched = work.len(), "migrating all mismatched connections");
        self.run_batch(work).await
    }

    /// Batch migration of one agent's connected phone numbers toward the
    /// agent's credential.
    #[instrument(skip(self))]
    pub async fn migrate_agent_phone_numbers(self: &Arc<Self>, agent_id: Uuid) -> Result<BatchSummary, PoolError> {
        let agent = self
            .repo
            .get_resource(ResourceKind::Agent, agent_id)
            .await?
            .ok_or_else(|| PoolError::not_found("agent"))?;
        let connections = self.repo.connections_for_agent(agent_id).await?;
        let work: Vec<(Uuid, Option<Uuid>)> = connections
            .into_iter()
            .map(|c| (c.phone_number_id, agent.credential_id))
            .collect();
        self.run_batch(work).await
    }

    pub fn ledger(&self) -> &LedgerService<R> {
        &self.ledger
    }

    /// Agents consume capacity slots; phones and voices follow their agent
    /// and only require the destination to be active.
    fn ensure_dest_usable(kind: ResourceKind, dest: &credential::Model) -> Result<(), PoolError> {
        match kind {
            ResourceKind::Agent => {
                if !has_spare_capacity(dest) {
                    return Err(PoolError::CapacityExhausted);
                }
            }
            ResourceKind::PhoneNumber | ResourceKind::Voice => {
                if !dest.is_active {
                    return Err(PoolError::Validation("destination credential is inactive".into()));
                }
            }
        }
        Ok(())
    }

    async fn create_registration(&self, secret: &str, resource: &ResourceRecord) -> Result<String, crate::remote::RemoteError> {
        match resource.kind {
            ResourceKind::Agent => {
                self.platform
                    .create_agent_registration(secret, &AgentSpec { name: resource.label.clone() })
                    .await
            }
            ResourceKind::PhoneNumber => {
                self.platform
                    .create_phone_registration(secret, &PhoneSpec { e164: resource.label.clone() })
                    .await
            }
            ResourceKind::Voice => {
                self.platform
                    .create_voice_registration(secret, &VoiceSpec { name: resource.label.clone() })
                    .await
            }
        }
    }

    async fn delete_registration(&self, secret: &str, kind: ResourceKind, remote_id: &str) -> Result<(), crate::remote::RemoteError> {
        match kind {
            ResourceKind::Agent => self.platform.delete_agent_registration(secret, remote_id).await,
            ResourceKind::PhoneNumber => self.platform.delete_phone_registration(secret, remote_id).await,
            ResourceKind::Voice => self.platform.delete_voice_registration(secret, remote_id).await,
        }
    }

    async fn record_failure(&self, attempt: &migration_attempt::Model, error: &str) -> Result<(), PoolError> {
        MIGRATION_FAILURES_TOTAL.inc();
        let count = attempt.attempt_count + 1;
        let status = if count >= self.max_attempts() { STATUS_DEAD } else { STATUS_FAILED };
        self.repo
            .update_attempt(attempt.id, status, count, Some(error.to_string()))
            .await?;
        warn!(
            attempt_id = %attempt.id,
            resource_id = %attempt.resource_id,
            attempt_count = count,
            status,
            error,
            "migration attempt failed"
        );
        Ok(())
    }

    /// The remote re-registration itself. Create on the destination, and
    /// only once that is acknowledged, deregister on the source. On create
    /// failure the assignment is untouched; the source registration was
    /// never removed, so rollback is implicit.
    async fn run_attempt(
        &self,
        resource: ResourceRecord,
        dest: credential::Model,
        attempt: migration_attempt::Model,
    ) -> Result<MigrationOutcome, PoolError> {
        let plan = MigrationPlan {
            resource_kind: resource.kind,
            resource_id: resource.id,
            resource_label: resource.label.clone(),
            source_credential_id: resource.credential_id,
            dest_credential_id: dest.id,
        };

        let new_remote_id = match self.create_registration(&dest.secret, &resource).await {
            Ok(id) => id,
            Err(remote_err) => {
                self.record_failure(&attempt, &remote_err.to_string()).await?;
                return Err(PoolError::Remote(remote_err));
            }
        };

        if let (Some(source_id), Some(old_remote)) = (resource.credential_id, resource.remote_id.clone()) {
            match self.repo.get_credential(source_id).await? {
                Some(source) => {
                    // Best effort: a stale source registration never blocks the
                    // migration once the destination is live.
                    if let Err(e) = self.delete_registration(&source.secret, resource.kind, &old_remote).await {
                        warn!(
                            resource_id = %resource.id,
                            source_credential_id = %source_id,
                            error = %e,
                            "source deregistration failed, stale registration left behind"
                        );
                    }
                }
                None => {
                    warn!(resource_id = %resource.id, source_credential_id = %source_id, "source credential missing, skipping deregistration");
                }
            }
        }

        self.ledger
            .record_assignment(resource.kind, resource.id, dest.id, Some(&new_remote_id))
            .await?;
        self.repo
            .update_attempt(attempt.id, STATUS_SUCCEEDED, attempt.attempt_count + 1, None)
            .await?;
        self.repo.supersede_attempts(resource.kind, resource.id, attempt.id).await?;
        MIGRATIONS_TOTAL.inc();
        info!(
            kind = %resource.kind,
            resource_id = %resource.id,
            source = ?plan.source_credential_id,
            dest = %dest.id,
            "resource migrated"
        );
        Ok(MigrationOutcome::Migrated(plan))
    }

    /// Worker pool over disjoint phone migrations. `dest = None` means the
    /// connected agent has no credential: reported as a per-item failure
    /// with a distinct reason, never silently skipped.
    async fn run_batch(self: &Arc<Self>, work: Vec<(Uuid, Option<Uuid>)>) -> Result<BatchSummary, PoolError> {
        let semaphore = Arc::new(Semaphore::new(self.cfg.batch_concurrency));
        let mut join = JoinSet::new();
        for (phone_id, dest) in work {
            let svc = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            join.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        return BatchItem::failed(ResourceKind::PhoneNumber, phone_id, dest, "worker pool closed");
                    }
                };
                match dest {
                    None => BatchItem::failed(
                        ResourceKind::PhoneNumber,
                        phone_id,
                        None,
                        &PoolError::NoTargetCredential("connected agent has no assigned credential".into()).to_string(),
                    ),
                    Some(dest_id) => {
                        match svc
                            .migrate_resource(ResourceKind::PhoneNumber, phone_id, dest_id, MigrateOptions::default())
                            .await
                        {
                            Ok(outcome) => BatchItem::ok(ResourceKind::PhoneNumber, phone_id, Some(dest_id), outcome.label()),
                            Err(e) => BatchItem::failed(ResourceKind::PhoneNumber, phone_id, Some(dest_id), &e.to_string()),
                        }
                    }
                }
            });
        }

        let mut items = Vec::new();
        while let Some(res) = join.join_next().await {
            match res {
                Ok(item) => items.push(item),
                Err(e) => error!(error = %e, "batch migration worker panicked"),
            }
        }
        Ok(BatchSummary::from_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::repository::mock::MockPoolRepository;
    use crate::remote::client::mock::{MockVoicePlatform, PlatformEvent};
    use crate::remote::RemoteError;

    struct Fixture {
        repo: Arc<MockPoolRepository>,
        platform: Arc<MockVoicePlatform>,
        svc: Arc<MigrationService<MockPoolRepository, MockVoicePlatform>>,
    }

    fn fixture() -> Fixture {
        fixture_with(MigrationConfig::default())
    }

    fn fixture_with(cfg: MigrationConfig) -> Fixture {
        let repo = Arc::new(MockPoolRepository::new());
        let platform = Arc::new(MockVoicePlatform::new());
        let ledger = Arc::new(LedgerService::new(Arc::clone(&repo)));
        let svc = Arc::new(MigrationService::new(
            Arc::clone(&repo),
            ledger,
            Arc::clone(&platform),
            cfg,
        ));
        Fixture { repo, platform, svc }
    }

    #[tokio::test]
    async fn migration_moves_registration_destination_first() {
        let f = fixture();
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let owner = Uuid::new_v4();
        // seed the existing registration on the source
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550100", Some(src.id), None);
        let remote_id = f
            .platform
            .create_phone_registration(&src.secret, &PhoneSpec { e164: "+14155550100".into() })
            .await
            .unwrap();
        f.repo
            .set_resource_assignment(ResourceKind::PhoneNumber, phone.id, Some(src.id), Some(remote_id))
            .await
            .unwrap();

        let outcome = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated(_)));

        // registered on exactly one credential at the end
        assert_eq!(f.platform.registration_count("+14155550100"), 1);

        // and at no point on zero: the create on dst precedes the delete on src
        let events: Vec<PlatformEvent> = f.platform.events();
        let create_idx = events
            .iter()
            .position(|e| matches!(e, PlatformEvent::Created { secret, .. } if *secret == dst.secret))
            .unwrap();
        let delete_idx = events
            .iter()
            .position(|e| matches!(e, PlatformEvent::Deleted { secret, .. } if *secret == src.secret))
            .unwrap();
        assert!(create_idx < delete_idx);

        let moved = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(moved.credential_id, Some(dst.id));

        let attempts = f.repo.attempts_snapshot();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, "succeeded");
    }

    #[tokio::test]
    async fn same_destination_is_a_noop() {
        let f = fixture();
        let cred = f.repo.add_credential("only", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550101", Some(cred.id), Some("r_1"));

        let outcome = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, cred.id, MigrateOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, MigrationOutcome::AlreadyAssigned { .. }));
        // no remote traffic, no attempt row
        assert!(f.platform.events().is_empty());
        assert!(f.repo.attempts_snapshot().is_empty());
    }

    #[tokio::test]
    async fn dry_run_reports_plan_without_side_effects() {
        let f = fixture();
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550102", Some(src.id), Some("r_1"));

        let outcome = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions { dry_run: true })
            .await
            .unwrap();
        match outcome {
            MigrationOutcome::DryRun(plan) => {
                assert_eq!(plan.source_credential_id, Some(src.id));
                assert_eq!(plan.dest_credential_id, dst.id);
                assert_eq!(plan.resource_label, "+14155550102");
            }
            other => panic!("expected dry run, got {:?}", other),
        }
        assert!(f.platform.events().is_empty());
        assert!(f.repo.attempts_snapshot().is_empty());
        let unchanged = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(unchanged.credential_id, Some(src.id));
    }

    #[tokio::test]
    async fn failed_create_leaves_assignment_and_queues_one_attempt() {
        let f = fixture();
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550103", Some(src.id), Some("r_1"));
        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);

        let res = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;
        assert!(matches!(res, Err(PoolError::Remote(RemoteError::Timeout))));

        let unchanged = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(unchanged.credential_id, Some(src.id));

        let attempts = f.repo.attempts_snapshot();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, "failed");
        assert_eq!(attempts[0].attempt_count, 1);
        assert!(attempts[0].last_error.is_some());
    }

    #[tokio::test]
    async fn attempt_goes_dead_at_max_attempts() {
        let f = fixture_with(MigrationConfig { max_attempts: 1, batch_concurrency: 5 });
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550104", Some(src.id), Some("r_1"));
        f.platform.fail_creates(&dst.secret, RemoteError::Unknown("boom".into()));

        let _ = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;
        let attempts = f.repo.attempts_snapshot();
        assert_eq!(attempts[0].status, "dead");
    }

    #[tokio::test]
    async fn agent_migration_rechecks_capacity_at_execution_time() {
        let f = fixture();
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 2);
        // dst filled up between selection and execution
        f.repo.patch_credential(dst.id, |c| c.assigned_agent_count = 2);
        let agent = f.repo.add_resource(ResourceKind::Agent, Uuid::new_v4(), "bot", Some(src.id), Some("r_1"));

        let res = f
            .svc
            .migrate_resource(ResourceKind::Agent, agent.id, dst.id, MigrateOptions::default())
            .await;
        assert!(matches!(res, Err(PoolError::CapacityExhausted)));
        assert!(f.platform.events().is_empty());
    }

    #[tokio::test]
    async fn source_delete_failure_does_not_fail_migration() {
        let f = fixture();
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550105", Some(src.id), Some("r_missing"));
        f.platform.fail_deletes(&src.secret, RemoteError::Unknown("unavailable".into()));

        let outcome = f
            .svc
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated(_)));
        let moved = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(moved.credential_id, Some(dst.id));
    }

    #[tokio::test]
    async fn migrate_all_mismatched_heals_drift() {
        let f = fixture();
        let x = f.repo.add_credential("x", 10);
        let y = f.repo.add_credential("y", 10);
        let owner = Uuid::new_v4();
        let agent = f.repo.add_resource(ResourceKind::Agent, owner, "bot", Some(x.id), Some("r_a"));
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550106", Some(y.id), None);
        let remote_id = f
            .platform
            .create_phone_registration(&y.secret, &PhoneSpec { e164: "+14155550106".into() })
            .await
            .unwrap();
        f.repo
            .set_resource_assignment(ResourceKind::PhoneNumber, phone.id, Some(y.id), Some(remote_id))
            .await
            .unwrap();
        f.repo.connect(phone.id, agent.id);

        // report flags the drift
        let report = f.svc.ledger().system_wide_drift_report().await.unwrap();
        let entry = report.iter().find(|e| e.phone_number_id == phone.id).unwrap();
        assert!(entry.needs_migration);
        assert_eq!(entry.phone_credential_id, Some(y.id));
        assert_eq!(entry.agent_credential_id, Some(x.id));

        let summary = f.svc.migrate_all_mismatched().await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);

        let moved = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(moved.credential_id, Some(x.id));

        // a second report shows no drift
        let after = f.svc.ledger().system_wide_drift_report().await.unwrap();
        assert!(after.iter().all(|e| !e.needs_migration));
    }

    #[tokio::test]
    async fn batch_isolates_per_resource_failures() {
        let f = fixture();
        let x = f.repo.add_credential("x", 10);
        let y = f.repo.add_credential("y", 10);
        let bad = f.repo.add_credential("bad", 10);
        let owner = Uuid::new_v4();

        // healthy pair: phone on y, agent on x
        let agent1 = f.repo.add_resource(ResourceKind::Agent, owner, "bot1", Some(x.id), Some("r_1"));
        let phone1 = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550107", Some(y.id), Some("r_2"));
        f.repo.connect(phone1.id, agent1.id);

        // pair whose destination rejects creates
        let agent2 = f.repo.add_resource(ResourceKind::Agent, owner, "bot2", Some(bad.id), Some("r_3"));
        let phone2 = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550108", Some(y.id), Some("r_4"));
        f.repo.connect(phone2.id, agent2.id);
        f.platform.fail_creates(&bad.secret, RemoteError::RateLimited);

        let summary = f.svc.migrate_all_mismatched().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        let failed_item = summary.per_item.iter().find(|i| !i.succeeded).unwrap();
        assert_eq!(failed_item.resource_id, phone2.id);
        assert!(failed_item.error.as_deref().unwrap_or_default().contains("rate limited"));
    }

    #[tokio::test]
    async fn unassigned_agent_reports_no_target_credential() {
        let f = fixture();
        let y = f.repo.add_credential("y", 10);
        let owner = Uuid::new_v4();
        let agent = f.repo.add_resource(ResourceKind::Agent, owner, "bot", None, None);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550109", Some(y.id), Some("r_1"));
        f.repo.connect(phone.id, agent.id);

        let summary = f.svc.migrate_agent_phone_numbers(agent.id).await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        let item = &summary.per_item[0];
        assert!(item.error.as_deref().unwrap().contains("cannot determine target credential"));
    }

    #[tokio::test]
    async fn migrate_agent_phone_numbers_scopes_to_that_agent() {
        let f = fixture();
        let x = f.repo.add_credential("x", 10);
        let y = f.repo.add_credential("y", 10);
        let owner = Uuid::new_v4();
        let agent = f.repo.add_resource(ResourceKind::Agent, owner, "bot", Some(x.id), Some("r_1"));
        let other_agent = f.repo.add_resource(ResourceKind::Agent, owner, "other", Some(x.id), Some("r_2"));

        let phone1 = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550110", Some(y.id), Some("r_3"));
        let phone2 = f.repo.add_resource(ResourceKind::PhoneNumber, owner, "+14155550111", Some(y.id), Some("r_4"));
        f.repo.connect(phone1.id, agent.id);
        f.repo.connect(phone2.id, other_agent.id);

        let summary = f.svc.migrate_agent_phone_numbers(agent.id).await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.per_item[0].resource_id, phone1.id);
    }
}
