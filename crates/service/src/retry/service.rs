use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::QueueStatus;
use crate::errors::PoolError;
use crate::migrate::domain::{BatchItem, BatchSummary};
use crate::migrate::service::MigrationService;
use crate::observability::RETRIES_REPLAYED_TOTAL;
use crate::pool::domain::ResourceKind;
use crate::pool::repository::PoolRepository;
use crate::remote::VoicePlatformClient;

#[derive(Debug, Clone)]
pub struct RetryQueueConfig {
    /// Attempts popped per replay.
    pub batch_size: u64,
}

impl Default for RetryQueueConfig {
    fn default() -> Self {
        Self { batch_size: 50 }
    }
}

/// Durable holding area for failed migrations. The queue is the set of
/// "failed" attempt rows still under the attempt limit; replays re-invoke
/// the engine with the original destination.
pub struct RetryQueueService<R: PoolRepository, C: VoicePlatformClient> {
    repo: Arc<R>,
    migrations: Arc<MigrationService<R, C>>,
    cfg: RetryQueueConfig,
}

impl<R, C> RetryQueueService<R, C>
where
    R: PoolRepository + 'static,
    C: VoicePlatformClient + 'static,
{
    pub fn new(repo: Arc<R>, migrations: Arc<MigrationService<R, C>>, cfg: RetryQueueConfig) -> Self {
        Self { repo, migrations, cfg }
    }

    /// Counts by state plus the oldest actionable attempt's age.
    pub async fn status(&self) -> Result<QueueStatus, PoolError> {
        let counts = self.repo.attempt_counts().await?;
        let oldest = self.repo.oldest_actionable_at(self.migrations.max_attempts()).await?;
        let oldest_failed_age_secs = oldest.map(|at| (Utc::now().signed_duration_since(at)).num_seconds().max(0));
        Ok(QueueStatus { counts, oldest_failed_age_secs })
    }

    /// Pop a bounded batch of actionable attempts, oldest first, and replay
    /// each toward its original destination. Draining the queue makes an
    /// immediate second invocation a no-op.
    #[instrument(skip(self))]
    pub async fn process_queue(&self) -> Result<BatchSummary, PoolError> {
        let attempts = self
            .repo
            .actionable_attempts(self.migrations.max_attempts(), self.cfg.batch_size)
            .await?;
        if attempts.is_empty() {
            return Ok(BatchSummary::from_items(Vec::new()));
        }
        info!(count = attempts.len(), "replaying retry queue");

        let mut items: Vec<BatchItem> = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            RETRIES_REPLAYED_TOTAL.inc();
            // kind strings are written from ResourceKind::as_str; a bad row
            // still gets reported, via retry_attempt's validation error
            let kind = ResourceKind::parse(&attempt.resource_kind).unwrap_or(ResourceKind::PhoneNumber);
            let resource_id: Uuid = attempt.resource_id;
            let dest = Some(attempt.dest_credential_id);
            match self.migrations.retry_attempt(&attempt).await {
                Ok(outcome) => items.push(BatchItem::ok(kind, resource_id, dest, outcome.label())),
                Err(e) => items.push(BatchItem::failed(kind, resource_id, dest, &e.to_string())),
            }
        }
        Ok(BatchSummary::from_items(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::service::LedgerService;
    use crate::migrate::domain::MigrateOptions;
    use crate::migrate::service::MigrationConfig;
    use crate::pool::domain::ResourceKind;
    use crate::pool::repository::mock::MockPoolRepository;
    use crate::remote::client::mock::MockVoicePlatform;
    use crate::remote::RemoteError;

    struct Fixture {
        repo: Arc<MockPoolRepository>,
        platform: Arc<MockVoicePlatform>,
        migrations: Arc<MigrationService<MockPoolRepository, MockVoicePlatform>>,
        queue: RetryQueueService<MockPoolRepository, MockVoicePlatform>,
    }

    fn fixture(max_attempts: u32) -> Fixture {
        let repo = Arc::new(MockPoolRepository::new());
        let platform = Arc::new(MockVoicePlatform::new());
        let ledger = Arc::new(LedgerService::new(Arc::clone(&repo)));
        let migrations = Arc::new(MigrationService::new(
            Arc::clone(&repo),
            ledger,
            Arc::clone(&platform),
            MigrationConfig { max_attempts, batch_concurrency: 5 },
        ));
        let queue = RetryQueueService::new(Arc::clone(&repo), Arc::clone(&migrations), RetryQueueConfig::default());
        Fixture { repo, platform, migrations, queue }
    }

    #[tokio::test]
    async fn replay_succeeds_after_failure_clears() {
        let f = fixture(3);
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550120", Some(src.id), Some("r_1"));
        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);

        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;
        let status = f.queue.status().await.unwrap();
        assert_eq!(status.counts.failed, 1);
        assert!(status.oldest_failed_age_secs.is_some());

        // outage over
        f.platform.clear_create_failures(&dst.secret);
        let summary = f.queue.process_queue().await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);

        let moved = f.repo.get_resource(ResourceKind::PhoneNumber, phone.id).await.unwrap().unwrap();
        assert_eq!(moved.credential_id, Some(dst.id));
        let status_after = f.queue.status().await.unwrap();
        assert_eq!(status_after.counts.failed, 0);
        assert_eq!(status_after.counts.succeeded, 1);
    }

    #[tokio::test]
    async fn second_process_call_is_a_noop() {
        let f = fixture(3);
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550121", Some(src.id), Some("r_1"));
        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);
        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;
        f.platform.clear_create_failures(&dst.secret);

        let first = f.queue.process_queue().await.unwrap();
        assert_eq!(first.total, 1);

        let second = f.queue.process_queue().await.unwrap();
        assert_eq!(second.total, 0);
    }

    #[tokio::test]
    async fn repeated_failure_past_max_goes_dead_but_is_retained() {
        let f = fixture(2);
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550122", Some(src.id), Some("r_1"));
        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);

        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;

        // still failing on replay: attempt_count reaches max and the row dies
        let summary = f.queue.process_queue().await.unwrap();
        assert_eq!(summary.failed, 1);

        let status = f.queue.status().await.unwrap();
        assert_eq!(status.counts.failed, 0);
        assert_eq!(status.counts.dead, 1);

        // audit record survives
        let attempts = f.repo.attempts_snapshot();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].attempt_count, 2);

        // nothing actionable left
        let after = f.queue.process_queue().await.unwrap();
        assert_eq!(after.total, 0);
    }

    #[tokio::test]
    async fn newer_success_supersedes_older_attempts() {
        let f = fixture(5);
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550123", Some(src.id), Some("r_1"));

        // first attempt fails and sits in the queue
        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);
        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;

        // a second, newer attempt for the same resource succeeds
        f.platform.clear_create_failures(&dst.secret);
        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await
            .unwrap();

        // the stale attempt is no longer actionable
        let status = f.queue.status().await.unwrap();
        assert_eq!(status.counts.failed, 0);
        assert_eq!(status.counts.succeeded, 1);
        assert_eq!(status.counts.dead, 1);
        let noop = f.queue.process_queue().await.unwrap();
        assert_eq!(noop.total, 0);
    }

    #[tokio::test]
    async fn replay_of_already_landed_resource_marks_attempt_succeeded() {
        let f = fixture(5);
        let src = f.repo.add_credential("src", 10);
        let dst = f.repo.add_credential("dst", 10);
        let phone = f.repo.add_resource(ResourceKind::PhoneNumber, Uuid::new_v4(), "+14155550124", Some(src.id), Some("r_1"));

        f.platform.fail_creates(&dst.secret, RemoteError::Timeout);
        let _ = f
            .migrations
            .migrate_resource(ResourceKind::PhoneNumber, phone.id, dst.id, MigrateOptions::default())
            .await;
        f.platform.clear_create_failures(&dst.secret);

        // resource lands on dst out of band
        f.repo
            .set_resource_assignment(ResourceKind::PhoneNumber, phone.id, Some(dst.id), Some("r_manual".into()))
            .await
            .unwrap();

        let summary = f.queue.process_queue().await.unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.per_item[0].outcome, "already_assigned");
    }
}
