use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::RemoteError;

/// Registration payload for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
}

/// Registration payload for a phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneSpec {
    pub e164: String,
}

/// Registration payload for a synthetic voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSpec {
    pub name: String,
}

/// Result of a capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Ok,
    /// The platform answered but reported a problem (e.g. HTTP 200 with an
    /// error body).
    Degraded(String),
}

/// Client boundary to the remote voice platform. Every call is a blocking
/// I/O boundary with its own timeout; callers must not hold locks across it.
#[async_trait]
pub trait VoicePlatformClient: Send + Sync {
    async fn create_agent_registration(&self, secret: &str, spec: &AgentSpec) -> Result<String, RemoteError>;
    async fn delete_agent_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError>;

    async fn create_phone_registration(&self, secret: &str, spec: &PhoneSpec) -> Result<String, RemoteError>;
    async fn delete_phone_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError>;

    async fn create_voice_registration(&self, secret: &str, spec: &VoiceSpec) -> Result<String, RemoteError>;
    async fn delete_voice_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError>;

    /// Lightweight list-capability call used by the health prober.
    async fn probe_capability(&self, secret: &str) -> Result<ProbeResult, RemoteError>;
}

/// In-memory platform for tests and doc examples. Keeps an ordered event
/// log so tests can assert registration ordering (a resource must never
/// exist on zero credentials during a migration).
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PlatformEvent {
        Created { secret: String, remote_id: String, label: String },
        Deleted { secret: String, remote_id: String },
        Probed { secret: String },
    }

    #[derive(Default)]
    struct MockState {
        /// (secret, remote_id) -> label
        registrations: HashMap<(String, String), String>,
        events: Vec<PlatformEvent>,
        /// secrets whose create calls fail with the given error
        failing_creates: HashMap<String, RemoteError>,
        /// secrets whose delete calls fail with the given error
        failing_deletes: HashMap<String, RemoteError>,
        /// secrets rejected outright (auth)
        rejected: HashMap<String, RemoteError>,
        /// secrets that probe as degraded
        degraded: HashMap<String, String>,
        next_id: u64,
    }

    #[derive(Default)]
    pub struct MockVoicePlatform {
        state: Mutex<MockState>,
    }

    impl MockVoicePlatform {
        pub fn new() -> Self { Self::default() }

        /// All create calls with this secret fail with `err` until cleared.
        pub fn fail_creates(&self, secret: &str, err: RemoteError) {
            self.state.lock().unwrap().failing_creates.insert(secret.to_string(), err);
        }

        pub fn clear_create_failures(&self, secret: &str) {
            self.state.lock().unwrap().failing_creates.remove(secret);
        }

        pub fn fail_deletes(&self, secret: &str, err: RemoteError) {
            self.state.lock().unwrap().failing_deletes.insert(secret.to_string(), err);
        }

        /// Probe and every other call with this secret fails with `err`.
        pub fn reject_secret(&self, secret: &str, err: RemoteError) {
            self.state.lock().unwrap().rejected.insert(secret.to_string(), err);
        }

        pub fn degrade_secret(&self, secret: &str, reason: &str) {
            self.state.lock().unwrap().degraded.insert(secret.to_string(), reason.to_string());
        }

        pub fn events(&self) -> Vec<PlatformEvent> {
            self.state.lock().unwrap().events.clone()
        }

        /// Number of live registrations carrying this label, across all
        /// secrets. The "exactly one credential" invariant checks this.
        pub fn registration_count(&self, label: &str) -> usize {
            self.state
                .lock()
                .unwrap()
                .registrations
                .values()
                .filter(|l| l.as_str() == label)
                .count()
        }

        pub fn is_registered(&self, secret: &str, remote_id: &str) -> bool {
            self.state
                .lock()
                .unwrap()
                .registrations
                .contains_key(&(secret.to_string(), remote_id.to_string()))
        }

        fn create(&self, secret: &str, label: &str) -> Result<String, RemoteError> {
            let mut st = self.state.lock().unwrap();
            if let Some(err) = st.rejected.get(secret) {
                return Err(err.clone());
            }
            if let Some(err) = st.failing_creates.get(secret) {
                return Err(err.clone());
            }
            st.next_id += 1;
            let remote_id = format!("r_{}", st.next_id);
            st.registrations.insert((secret.to_string(), remote_id.clone()), label.to_string());
            st.events.push(PlatformEvent::Created {
                secret: secret.to_string(),
                remote_id: remote_id.clone(),
                label: label.to_string(),
            });
            Ok(remote_id)
        }

        fn delete(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
            let mut st = self.state.lock().unwrap();
            if let Some(err) = st.rejected.get(secret) {
                return Err(err.clone());
            }
            if let Some(err) = st.failing_deletes.get(secret) {
                return Err(err.clone());
            }
            if st.registrations.remove(&(secret.to_string(), remote_id.to_string())).is_none() {
                return Err(RemoteError::NotFound);
            }
            st.events.push(PlatformEvent::Deleted {
                secret: secret.to_string(),
                remote_id: remote_id.to_string(),
            });
            Ok(())
        }
    }

    #[async_trait]
    impl VoicePlatformClient for MockVoicePlatform {
        async fn create_agent_registration(&self, secret: &str, spec: &AgentSpec) -> Result<String, RemoteError> {
            self.create(secret, &spec.name)
        }

        async fn delete_agent_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
            self.delete(secret, remote_id)
        }

        async fn create_phone_registration(&self, secret: &str, spec: &PhoneSpec) -> Result<String, RemoteError> {
            self.create(secret, &spec.e164)
        }

        async fn delete_phone_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
            self.delete(secret, remote_id)
        }

        async fn create_voice_registration(&self, secret: &str, spec: &VoiceSpec) -> Result<String, RemoteError> {
            self.create(secret, &spec.name)
        }

        async fn delete_voice_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
            self.delete(secret, remote_id)
        }

        async fn probe_capability(&self, secret: &str) -> Result<ProbeResult, RemoteError> {
            let mut st = self.state.lock().unwrap();
            st.events.push(PlatformEvent::Probed { secret: secret.to_string() });
            if let Some(err) = st.rejected.get(secret) {
                return Err(err.clone());
            }
            if let Some(reason) = st.degraded.get(secret) {
                return Ok(ProbeResult::Degraded(reason.clone()));
            }
            Ok(ProbeResult::Ok)
        }
    }
}
