use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::client::{AgentSpec, PhoneSpec, ProbeResult, VoicePlatformClient, VoiceSpec};
use super::errors::RemoteError;

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    #[serde(default)]
    error: Option<String>,
}

/// reqwest-backed client for the remote voice platform. Bearer-secret auth,
/// one fixed timeout per request.
pub struct HttpVoicePlatform {
    base_url: String,
    http: reqwest::Client,
}

impl HttpVoicePlatform {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Unknown(e.to_string()))?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    fn map_transport(e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Unknown(e.to_string())
        }
    }

    fn map_status(status: StatusCode, body: String) -> RemoteError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Auth,
            StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited,
            StatusCode::NOT_FOUND => RemoteError::NotFound,
            s => RemoteError::Unknown(format!("{}: {}", s, body)),
        }
    }

    async fn create<T: serde::Serialize + Sync>(&self, secret: &str, path: &str, spec: &T) -> Result<String, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(secret)
            .json(spec)
            .send()
            .await
            .map_err(Self::map_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        let created: CreatedResponse = resp.json().await.map_err(Self::map_transport)?;
        debug!(%url, remote_id = %created.id, "remote registration created");
        Ok(created.id)
    }

    async fn delete(&self, secret: &str, path: &str, remote_id: &str) -> Result<(), RemoteError> {
        let url = format!("{}{}/{}", self.base_url, path, remote_id);
        let resp = self
            .http
            .delete(&url)
            .bearer_auth(secret)
            .send()
            .await
            .map_err(Self::map_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        debug!(%url, "remote registration deleted");
        Ok(())
    }
}

#[async_trait]
impl VoicePlatformClient for HttpVoicePlatform {
    async fn create_agent_registration(&self, secret: &str, spec: &AgentSpec) -> Result<String, RemoteError> {
        self.create(secret, "/v1/agents", spec).await
    }

    async fn delete_agent_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
        self.delete(secret, "/v1/agents", remote_id).await
    }

    async fn create_phone_registration(&self, secret: &str, spec: &PhoneSpec) -> Result<String, RemoteError> {
        self.create(secret, "/v1/phone-numbers", spec).await
    }

    async fn delete_phone_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
        self.delete(secret, "/v1/phone-numbers", remote_id).await
    }

    async fn create_voice_registration(&self, secret: &str, spec: &VoiceSpec) -> Result<String, RemoteError> {
        self.create(secret, "/v1/voices", spec).await
    }

    async fn delete_voice_registration(&self, secret: &str, remote_id: &str) -> Result<(), RemoteError> {
        self.delete(secret, "/v1/voices", remote_id).await
    }

    async fn probe_capability(&self, secret: &str) -> Result<ProbeResult, RemoteError> {
        let url = format!("{}/v1/agents?limit=1", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(secret)
            .send()
            .await
            .map_err(Self::map_transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        // A 200 carrying an error body counts as degraded, not healthy.
        let probe: ProbeResponse = resp.json().await.unwrap_or(ProbeResponse { error: None });
        match probe.error {
            Some(reason) => Ok(ProbeResult::Degraded(reason)),
            None => Ok(ProbeResult::Ok),
        }
    }
}
