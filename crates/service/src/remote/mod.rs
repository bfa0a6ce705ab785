pub mod errors;
pub mod client;
pub mod http;

pub use client::{AgentSpec, PhoneSpec, ProbeResult, VoicePlatformClient, VoiceSpec};
pub use errors::RemoteError;
