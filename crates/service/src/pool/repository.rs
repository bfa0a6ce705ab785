use async_trait::async_trait;
use models::{connection, credential, migration_attempt};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::domain::{AttemptCounts, ResourceKind, ResourceRecord};
use crate::errors::PoolError;

/// Repository abstraction for pool, ledger and migration persistence.
/// The backing store is the single source of truth; every operation reads
/// fresh state through this trait.
#[async_trait]
pub trait PoolRepository: Send + Sync {
    // credentials
    async fn list_credentials(&self) -> Result<Vec<credential::Model>, PoolError>;
    async fn get_credential(&self, id: Uuid) -> Result<Option<credential::Model>, PoolError>;
    /// Overwrite stored counters wholesale (reconciliation).
    async fn set_counts(&self, credential_id: Uuid, agents: i32, users: i32, over_capacity: bool) -> Result<(), PoolError>;
    /// Incremental counter updates; an optimization only, repaired by
    /// reconciliation after crashes mid-operation.
    async fn adjust_agent_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError>;
    async fn adjust_user_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError>;
    async fn set_health(&self, credential_id: Uuid, status: &str, checked_at: DateTimeWithTimeZone) -> Result<(), PoolError>;

    // resources
    async fn get_resource(&self, kind: ResourceKind, id: Uuid) -> Result<Option<ResourceRecord>, PoolError>;
    /// Update assignment; `remote_id = None` leaves the stored remote id
    /// untouched.
    async fn set_resource_assignment(
        &self,
        kind: ResourceKind,
        id: Uuid,
        credential_id: Option<Uuid>,
        remote_id: Option<String>,
    ) -> Result<(), PoolError>;
    async fn list_agents_by_owner(&self, owner_id: Uuid) -> Result<Vec<ResourceRecord>, PoolError>;
    async fn count_agents_on(&self, credential_id: Uuid) -> Result<i64, PoolError>;
    async fn count_distinct_owners_on(&self, credential_id: Uuid) -> Result<i64, PoolError>;
    async fn count_owner_resources_on(&self, credential_id: Uuid, owner_id: Uuid) -> Result<i64, PoolError>;

    // connections
    async fn list_connections(&self) -> Result<Vec<connection::Model>, PoolError>;
    async fn connections_for_agent(&self, agent_id: Uuid) -> Result<Vec<connection::Model>, PoolError>;
    async fn list_unconnected_phones(&self) -> Result<Vec<ResourceRecord>, PoolError>;

    // migration attempts
    async fn insert_attempt(
        &self,
        kind: ResourceKind,
        resource_id: Uuid,
        source_credential_id: Option<Uuid>,
        dest_credential_id: Uuid,
    ) -> Result<migration_attempt::Model, PoolError>;
    async fn update_attempt(&self, id: Uuid, status: &str, attempt_count: i32, last_error: Option<String>) -> Result<(), PoolError>;
    /// Failed attempts still under the attempt limit, oldest first.
    async fn actionable_attempts(&self, max_attempts: i32, limit: u64) -> Result<Vec<migration_attempt::Model>, PoolError>;
    /// Mark older actionable attempts for the resource as superseded.
    async fn supersede_attempts(&self, kind: ResourceKind, resource_id: Uuid, keep: Uuid) -> Result<u64, PoolError>;
    async fn attempt_counts(&self) -> Result<AttemptCounts, PoolError>;
    async fn oldest_actionable_at(&self, max_attempts: i32) -> Result<Option<DateTimeWithTimeZone>, PoolError>;
}

/// Simple in-memory repository for tests and doc examples.
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};

    use super::*;

    #[derive(Default)]
    struct MockState {
        credentials: HashMap<Uuid, credential::Model>,
        resources: HashMap<(ResourceKind, Uuid), ResourceRecord>,
        connections: Vec<connection::Model>,
        attempts: Vec<migration_attempt::Model>,
        seq: i64,
    }

    #[derive(Default)]
    pub struct MockPoolRepository {
        state: Mutex<MockState>,
    }

    impl MockPoolRepository {
        pub fn new() -> Self { Self::default() }

        /// Insert a credential; creation timestamps are strictly increasing
        /// so insertion-order tie-breaks are deterministic.
        pub fn add_credential(&self, name: &str, max_agents: i32) -> credential::Model {
            let mut st = self.state.lock().unwrap();
            st.seq += 1;
            let now = (Utc::now() + Duration::seconds(st.seq)).into();
            let model = credential::Model {
                id: Uuid::new_v4(),
                name: name.to_string(),
                secret: format!("sk_{name}"),
                is_active: true,
                health_status: "unknown".into(),
                max_agents,
                assigned_agent_count: 0,
                assigned_user_count: 0,
                over_capacity: false,
                last_health_check_at: None,
                created_at: now,
                updated_at: now,
            };
            st.credentials.insert(model.id, model.clone());
            model
        }

        pub fn patch_credential(&self, id: Uuid, f: impl FnOnce(&mut credential::Model)) {
            let mut st = self.state.lock().unwrap();
            if let Some(c) = st.credentials.get_mut(&id) {
                f(c);
            }
        }

        pub fn add_resource(
            &self,
            kind: ResourceKind,
            owner_id: Uuid,
            label: &str,
            credential_id: Option<Uuid>,
            remote_id: Option<&str>,
        ) -> ResourceRecord {
            let record = ResourceRecord {
                kind,
                id: Uuid::new_v4(),
                owner_id,
                label: label.to_string(),
                remote_id: remote_id.map(str::to_string),
                credential_id,
            };
            self.state.lock().unwrap().resources.insert((kind, record.id), record.clone());
            record
        }

        pub fn connect(&self, phone_number_id: Uuid, agent_id: Uuid) -> connection::Model {
            let model = connection::Model {
                id: Uuid::new_v4(),
                phone_number_id,
                agent_id,
                created_at: Utc::now().into(),
            };
            self.state.lock().unwrap().connections.push(model.clone());
            model
        }

        pub fn attempts_snapshot(&self) -> Vec<migration_attempt::Model> {
            self.state.lock().unwrap().attempts.clone()
        }

        pub fn credential_snapshot(&self, id: Uuid) -> Option<credential::Model> {
            self.state.lock().unwrap().credentials.get(&id).cloned()
        }
    }

    #[async_trait]
    impl PoolRepository for MockPoolRepository {
        async fn list_credentials(&self) -> Result<Vec<credential::Model>, PoolError> {
            let mut creds: Vec<_> = self.state.lock().unwrap().credentials.values().cloned().collect();
            creds.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(creds)
        }

        async fn get_credential(&self, id: Uuid) -> Result<Option<credential::Model>, PoolError> {
            Ok(self.state.lock().unwrap().credentials.get(&id).cloned())
        }

        async fn set_counts(&self, credential_id: Uuid, agents: i32, users: i32, over_capacity: bool) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let c = st
                .credentials
                .get_mut(&credential_id)
                .ok_or_else(|| PoolError::not_found("credential"))?;
            c.assigned_agent_count = agents;
            c.assigned_user_count = users;
            c.over_capacity = over_capacity;
            Ok(())
        }

        async fn adjust_agent_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let c = st
                .credentials
                .get_mut(&credential_id)
                .ok_or_else(|| PoolError::not_found("credential"))?;
            c.assigned_agent_count = (c.assigned_agent_count + delta).max(0);
            Ok(())
        }

        async fn adjust_user_count(&self, credential_id: Uuid, delta: i32) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let c = st
                .credentials
                .get_mut(&credential_id)
                .ok_or_else(|| PoolError::not_found("credential"))?;
            c.assigned_user_count = (c.assigned_user_count + delta).max(0);
            Ok(())
        }

        async fn set_health(&self, credential_id: Uuid, status: &str, checked_at: DateTimeWithTimeZone) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let c = st
                .credentials
                .get_mut(&credential_id)
                .ok_or_else(|| PoolError::not_found("credential"))?;
            c.health_status = status.to_string();
            c.last_health_check_at = Some(checked_at);
            Ok(())
        }

        async fn get_resource(&self, kind: ResourceKind, id: Uuid) -> Result<Option<ResourceRecord>, PoolError> {
            Ok(self.state.lock().unwrap().resources.get(&(kind, id)).cloned())
        }

        async fn set_resource_assignment(
            &self,
            kind: ResourceKind,
            id: Uuid,
            credential_id: Option<Uuid>,
            remote_id: Option<String>,
        ) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let r = st
                .resources
                .get_mut(&(kind, id))
                .ok_or_else(|| PoolError::not_found("resource"))?;
            r.credential_id = credential_id;
            if let Some(rid) = remote_id {
                r.remote_id = Some(rid);
            }
            Ok(())
        }

        async fn list_agents_by_owner(&self, owner_id: Uuid) -> Result<Vec<ResourceRecord>, PoolError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .resources
                .values()
                .filter(|r| r.kind == ResourceKind::Agent && r.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn count_agents_on(&self, credential_id: Uuid) -> Result<i64, PoolError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .resources
                .values()
                .filter(|r| r.kind == ResourceKind::Agent && r.credential_id == Some(credential_id))
                .count() as i64)
        }

        async fn count_distinct_owners_on(&self, credential_id: Uuid) -> Result<i64, PoolError> {
            let st = self.state.lock().unwrap();
            let owners: std::collections::HashSet<Uuid> = st
                .resources
                .values()
                .filter(|r| r.credential_id == Some(credential_id))
                .map(|r| r.owner_id)
                .collect();
            Ok(owners.len() as i64)
        }

        async fn count_owner_resources_on(&self, credential_id: Uuid, owner_id: Uuid) -> Result<i64, PoolError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .resources
                .values()
                .filter(|r| r.credential_id == Some(credential_id) && r.owner_id == owner_id)
                .count() as i64)
        }

        async fn list_connections(&self) -> Result<Vec<connection::Model>, PoolError> {
            Ok(self.state.lock().unwrap().connections.clone())
        }

        async fn connections_for_agent(&self, agent_id: Uuid) -> Result<Vec<connection::Model>, PoolError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .connections
                .iter()
                .filter(|c| c.agent_id == agent_id)
                .cloned()
                .collect())
        }

        async fn list_unconnected_phones(&self) -> Result<Vec<ResourceRecord>, PoolError> {
            let st = self.state.lock().unwrap();
            let connected: std::collections::HashSet<Uuid> =
                st.connections.iter().map(|c| c.phone_number_id).collect();
            Ok(st
                .resources
                .values()
                .filter(|r| r.kind == ResourceKind::PhoneNumber && !connected.contains(&r.id))
                .cloned()
                .collect())
        }

        async fn insert_attempt(
            &self,
            kind: ResourceKind,
            resource_id: Uuid,
            source_credential_id: Option<Uuid>,
            dest_credential_id: Uuid,
        ) -> Result<migration_attempt::Model, PoolError> {
            let mut st = self.state.lock().unwrap();
            st.seq += 1;
            let now = (Utc::now() + Duration::seconds(st.seq)).into();
            let model = migration_attempt::Model {
                id: Uuid::new_v4(),
                resource_kind: kind.as_str().to_string(),
                resource_id,
                source_credential_id,
                dest_credential_id,
                status: "pending".into(),
                attempt_count: 0,
                last_error: None,
                created_at: now,
                updated_at: now,
            };
            st.attempts.push(model.clone());
            Ok(model)
        }

        async fn update_attempt(&self, id: Uuid, status: &str, attempt_count: i32, last_error: Option<String>) -> Result<(), PoolError> {
            let mut st = self.state.lock().unwrap();
            let a = st
                .attempts
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| PoolError::not_found("migration attempt"))?;
            a.status = status.to_string();
            a.attempt_count = attempt_count;
            a.last_error = last_error;
            a.updated_at = Utc::now().into();
            Ok(())
        }

        async fn actionable_attempts(&self, max_attempts: i32, limit: u64) -> Result<Vec<migration_attempt::Model>, PoolError> {
            let st = self.state.lock().unwrap();
            let mut rows: Vec<_> = st
                .attempts
                .iter()
                .filter(|a| a.status == "failed" && a.attempt_count < max_attempts)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn supersede_attempts(&self, kind: ResourceKind, resource_id: Uuid, keep: Uuid) -> Result<u64, PoolError> {
            let mut st = self.state.lock().unwrap();
            let mut n = 0;
            for a in st.attempts.iter_mut() {
                if a.resource_kind == kind.as_str() && a.resource_id == resource_id && a.id != keep && a.status == "failed" {
                    a.status = "dead".into();
                    a.last_error = Some("superseded by newer attempt".into());
                    n += 1;
                }
            }
            Ok(n)
        }

        async fn attempt_counts(&self) -> Result<AttemptCounts, PoolError> {
            let st = self.state.lock().unwrap();
            let mut counts = AttemptCounts::default();
            for a in &st.attempts {
                match a.status.as_str() {
                    "pending" => counts.pending += 1,
                    "succeeded" => counts.succeeded += 1,
                    "failed" => counts.failed += 1,
                    "dead" => counts.dead += 1,
                    _ => {}
                }
            }
            Ok(counts)
        }

        async fn oldest_actionable_at(&self, max_attempts: i32) -> Result<Option<DateTimeWithTimeZone>, PoolError> {
            let st = self.state.lock().unwrap();
            Ok(st
                .attempts
                .iter()
                .filter(|a| a.status == "failed" && a.attempt_count < max_attempts)
                .map(|a| a.created_at)
                .min())
        }
    }
}
