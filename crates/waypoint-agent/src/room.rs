//! Room attachment: LiveKit access, participant metadata, and the
//! per-participant noise-cancellation selection applied at audio-input
//! binding time.

use crate::error::AgentError;
use async_trait::async_trait;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::RoomClient;
use livekit_protocol::participant_info;
use livekit_protocol::ParticipantInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use waypoint_types::{NoiseCancellation, ParticipantKind};

fn default_token_ttl_seconds() -> u64 {
    3600
}

/// Connection settings for the LiveKit deployment.
#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for agent join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

/// Maps LiveKit participant metadata to the closed [`ParticipantKind`] set.
pub fn participant_kind(info: &ParticipantInfo) -> ParticipantKind {
    match info.kind() {
        participant_info::Kind::Standard => ParticipantKind::Standard,
        participant_info::Kind::Ingress => ParticipantKind::Ingress,
        participant_info::Kind::Egress => ParticipantKind::Egress,
        participant_info::Kind::Sip => ParticipantKind::Sip,
        participant_info::Kind::Agent => ParticipantKind::Agent,
    }
}

/// A snapshot of the room a job is dispatched into.
///
/// Constructible from parts so sessions can be assembled and tested without
/// a reachable LiveKit server.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: String,
    participants: Vec<ParticipantInfo>,
}

impl RoomHandle {
    pub fn new(name: impl Into<String>, participants: Vec<ParticipantInfo>) -> Self {
        Self {
            name: name.into(),
            participants,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participants(&self) -> &[ParticipantInfo] {
        &self.participants
    }
}

/// Audio-input options, evaluated per participant when their input is bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioInputOptions {
    /// Fixed cancellation variant applied to every participant instead of
    /// the per-kind mapping. `None` selects by transport kind.
    pub noise_cancellation_override: Option<NoiseCancellation>,
}

impl AudioInputOptions {
    /// Resolves the cancellation variant for one participant.
    pub fn cancellation_for(&self, kind: ParticipantKind) -> NoiseCancellation {
        self.noise_cancellation_override
            .unwrap_or_else(|| NoiseCancellation::for_participant(kind))
    }
}

/// Options applied when a session attaches to a room.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomOptions {
    pub audio_input: AudioInputOptions,
}

/// Directory of rooms the dispatcher can hand jobs out of.
///
/// [`RoomService`] is the production implementation; tests provide an
/// in-memory one.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Fetches a snapshot of the named room and its current participants.
    async fn fetch_room(&self, name: &str) -> Result<RoomHandle, AgentError>;

    /// Issues an agent-scoped join token for the named room.
    fn agent_token(&self, room_name: &str, identity: &str) -> Result<String, AgentError>;
}

/// LiveKit-backed room access for the worker.
#[derive(Debug)]
pub struct RoomService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl RoomService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl RoomDirectory for RoomService {
    async fn fetch_room(&self, name: &str) -> Result<RoomHandle, AgentError> {
        let participants = self
            .room_client
            .list_participants(name)
            .await
            .map_err(|e| AgentError::RoomService(e.to_string()))?;

        Ok(RoomHandle::new(name, participants))
    }

    fn agent_token(&self, room_name: &str, identity: &str) -> Result<String, AgentError> {
        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                agent: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(AgentError::LiveKit)
    }
}
