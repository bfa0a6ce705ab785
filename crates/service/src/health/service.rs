use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::domain::ProbeOutcome;
use crate::errors::PoolError;
use crate::observability::PROBES_TOTAL;
use crate::pool::domain::HealthState;
use crate::pool::repository::PoolRepository;
use crate::remote::{ProbeResult, RemoteError, VoicePlatformClient};

/// Periodically verifies each active credential's secret against the remote
/// platform. A failing probe only removes the credential from allocation
/// until it recovers; it never triggers migration, so transient network
/// blips cannot cascade.
pub struct HealthService<R: PoolRepository, C: VoicePlatformClient> {
    repo: Arc<R>,
    platform: Arc<C>,
    probe_timeout: Duration,
}

impl<R: PoolRepository, C: VoicePlatformClient> HealthService<R, C> {
    pub fn new(repo: Arc<R>, platform: Arc<C>, probe_timeout: Duration) -> Self {
        Self { repo, platform, probe_timeout }
    }

    /// Probe every active credential and persist the resulting health state.
    #[instrument(skip(self))]
    pub async fn perform_health_checks(&self) -> Result<Vec<ProbeOutcome>, PoolError> {
        let mut outcomes = Vec::new();
        for cred in self.repo.list_credentials().await? {
            if !cred.is_active {
                continue;
            }
            PROBES_TOTAL.inc();
            let started = Instant::now();
            let (status, detail) = match timeout(self.probe_timeout, self.platform.probe_capability(&cred.secret)).await {
                Ok(Ok(ProbeResult::Ok)) => (HealthState::Healthy, None),
                Ok(Ok(ProbeResult::Degraded(reason))) => (HealthState::Degraded, Some(reason)),
                Ok(Err(RemoteError::Auth)) => {
                    // Secret rejected: operator must fix or deactivate; no
                    // automatic migration away.
                    (HealthState::Unreachable, Some(RemoteError::Auth.to_string()))
                }
                Ok(Err(e)) => (HealthState::Unreachable, Some(e.to_string())),
                Err(_) => (HealthState::Unreachable, Some("probe timed out".to_string())),
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            self.repo.set_health(cred.id, status.as_str(), Utc::now().into()).await?;
            match status {
                HealthState::Healthy => {
                    info!(credential_id = %cred.id, latency_ms, "credential healthy");
                }
                _ => {
                    warn!(credential_id = %cred.id, status = status.as_str(), detail = ?detail, "credential unhealthy");
                }
            }
            outcomes.push(ProbeOutcome {
                credential_id: cred.id,
                name: cred.name,
                status,
                latency_ms,
                detail,
            });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::repository::mock::MockPoolRepository;
    use crate::remote::client::mock::MockVoicePlatform;

    fn service(
        repo: &Arc<MockPoolRepository>,
        platform: &Arc<MockVoicePlatform>,
    ) -> HealthService<MockPoolRepository, MockVoicePlatform> {
        HealthService::new(Arc::clone(repo), Arc::clone(platform), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn probe_marks_healthy_degraded_and_unreachable() {
        let repo = Arc::new(MockPoolRepository::new());
        let platform = Arc::new(MockVoicePlatform::new());
        let good = repo.add_credential("good", 10);
        let partial = repo.add_credential("partial", 10);
        let rejected = repo.add_credential("rejected", 10);
        platform.degrade_secret(&partial.secret, "quota warning");
        platform.reject_secret(&rejected.secret, RemoteError::Auth);

        let outcomes = service(&repo, &platform).perform_health_checks().await.unwrap();
        assert_eq!(outcomes.len(), 3);

        assert_eq!(repo.credential_snapshot(good.id).unwrap().health_status, "healthy");
        assert_eq!(repo.credential_snapshot(partial.id).unwrap().health_status, "degraded");
        assert_eq!(repo.credential_snapshot(rejected.id).unwrap().health_status, "unreachable");

        for c in [good.id, partial.id, rejected.id] {
            assert!(repo.credential_snapshot(c).unwrap().last_health_check_at.is_some());
        }
    }

    #[tokio::test]
    async fn inactive_credentials_are_not_probed() {
        let repo = Arc::new(MockPoolRepository::new());
        let platform = Arc::new(MockVoicePlatform::new());
        let dormant = repo.add_credential("dormant", 10);
        repo.patch_credential(dormant.id, |c| c.is_active = false);

        let outcomes = service(&repo, &platform).perform_health_checks().await.unwrap();
        assert!(outcomes.is_empty());
        assert!(platform.events().is_empty());
    }

    #[tokio::test]
    async fn recovery_restores_allocatability() {
        let repo = Arc::new(MockPoolRepository::new());
        let platform = Arc::new(MockVoicePlatform::new());
        let cred = repo.add_credential("flaky", 10);
        repo.patch_credential(cred.id, |c| c.health_status = "unreachable".into());

        let svc = service(&repo, &platform);
        svc.perform_health_checks().await.unwrap();
        let after = repo.credential_snapshot(cred.id).unwrap();
        assert_eq!(after.health_status, "healthy");
        assert!(crate::pool::domain::is_allocatable(&after));
    }
}
