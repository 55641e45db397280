//! Session configuration and lifecycle.
//!
//! A session is an immutable bundle of five capability selections plus one
//! latency flag, constructed fresh per job and never mutated after build.
//! Its lifecycle is the only state machine in the system: `Created ->
//! Started`, with no retries and no teardown semantics of its own.

use crate::error::AgentError;
use crate::inference::{ReplyGenerator, ReplyRequest};
use crate::persona::Persona;
use crate::room::{participant_kind, RoomHandle, RoomOptions};
use crate::vad::VadModel;
use livekit_protocol::ParticipantInfo;
use std::sync::Arc;
use tracing::{debug, info};
use waypoint_types::{
    LlmBackend, NoiseCancellation, ParticipantKind, SttBackend, TtsBackend, TurnDetector,
};

/// Immutable per-call session configuration: five capability slots plus the
/// preemptive-generation flag.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub stt: SttBackend,
    pub llm: LlmBackend,
    pub tts: TtsBackend,
    pub turn_detector: TurnDetector,
    /// Process-shared voice-activity detector, loaded at warm-up.
    pub vad: Arc<VadModel>,
    /// Start generating a reply before the user has finished speaking.
    pub preemptive_generation: bool,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder enforcing that every capability slot is filled.
///
/// A missing slot is a configuration error for the job, reported to the
/// dispatcher; there are no fallback backends.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    stt: Option<SttBackend>,
    llm: Option<LlmBackend>,
    tts: Option<TtsBackend>,
    turn_detector: Option<TurnDetector>,
    vad: Option<Arc<VadModel>>,
    preemptive_generation: bool,
}

impl SessionConfigBuilder {
    pub fn stt(mut self, stt: SttBackend) -> Self {
        self.stt = Some(stt);
        self
    }

    pub fn llm(mut self, llm: LlmBackend) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tts(mut self, tts: TtsBackend) -> Self {
        self.tts = Some(tts);
        self
    }

    pub fn turn_detector(mut self, turn_detector: TurnDetector) -> Self {
        self.turn_detector = Some(turn_detector);
        self
    }

    pub fn vad(mut self, vad: Arc<VadModel>) -> Self {
        self.vad = Some(vad);
        self
    }

    pub fn preemptive_generation(mut self, enabled: bool) -> Self {
        self.preemptive_generation = enabled;
        self
    }

    pub fn build(self) -> Result<SessionConfig, AgentError> {
        Ok(SessionConfig {
            stt: self.stt.ok_or(AgentError::MissingBackend("stt"))?,
            llm: self.llm.ok_or(AgentError::MissingBackend("llm"))?,
            tts: self.tts.ok_or(AgentError::MissingBackend("tts"))?,
            turn_detector: self
                .turn_detector
                .ok_or(AgentError::MissingBackend("turn_detector"))?,
            vad: self.vad.ok_or(AgentError::MissingBackend("vad"))?,
            preemptive_generation: self.preemptive_generation,
        })
    }
}

/// Noise-cancellation binding recorded for one participant's audio input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBinding {
    pub identity: String,
    pub kind: ParticipantKind,
    pub cancellation: NoiseCancellation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Created,
    Started,
}

/// A conversational agent session bound to one call.
///
/// Owned exclusively by that call; dropped with it.
pub struct AgentSession {
    config: SessionConfig,
    generator: Arc<dyn ReplyGenerator>,
    state: SessionState,
    options: RoomOptions,
    room_name: Option<String>,
    agent_token: Option<String>,
    bindings: Vec<AudioBinding>,
}

impl AgentSession {
    pub fn new(config: SessionConfig, generator: Arc<dyn ReplyGenerator>) -> Self {
        Self {
            config,
            generator,
            state: SessionState::Created,
            options: RoomOptions::default(),
            room_name: None,
            agent_token: None,
            bindings: Vec::new(),
        }
    }

    /// Starts the session against a persona and room.
    ///
    /// Binds a noise-cancellation variant to every current participant's
    /// audio input, transitions to `Started`, then fires the persona's
    /// `on_enter` hook exactly once. A second start fails with
    /// [`AgentError::AlreadyStarted`].
    pub async fn start(
        &mut self,
        persona: &Persona,
        room: &RoomHandle,
        options: RoomOptions,
    ) -> Result<(), AgentError> {
        if self.state == SessionState::Started {
            return Err(AgentError::AlreadyStarted);
        }

        self.options = options;
        for participant in room.participants() {
            let kind = participant_kind(participant);
            let cancellation = self.options.audio_input.cancellation_for(kind);
            debug!(
                identity = %participant.identity,
                kind = kind.as_str(),
                module = cancellation.module(),
                "bound participant audio input"
            );
            self.bindings.push(AudioBinding {
                identity: participant.identity.clone(),
                kind,
                cancellation,
            });
        }

        self.room_name = Some(room.name().to_string());
        self.state = SessionState::Started;
        info!(
            room = room.name(),
            persona = persona.name(),
            participants = room.participants().len(),
            preemptive = self.config.preemptive_generation,
            "agent session started"
        );

        persona.on_enter(self).await
    }

    /// Binds a participant who joined after the session started.
    pub fn bind_participant(
        &mut self,
        participant: &ParticipantInfo,
    ) -> Result<AudioBinding, AgentError> {
        if self.state != SessionState::Started {
            return Err(AgentError::NotStarted);
        }

        let kind = participant_kind(participant);
        let binding = AudioBinding {
            identity: participant.identity.clone(),
            kind,
            cancellation: self.options.audio_input.cancellation_for(kind),
        };
        self.bindings.push(binding.clone());
        Ok(binding)
    }

    /// Requests generation of one spoken reply from the configured LLM.
    pub async fn generate_reply(
        &self,
        instructions: &str,
        allow_interruptions: bool,
    ) -> Result<(), AgentError> {
        self.generator
            .generate_reply(
                &self.config.llm.model,
                ReplyRequest {
                    instructions: instructions.to_string(),
                    allow_interruptions,
                },
            )
            .await
    }

    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    /// Noise-cancellation bindings recorded so far, in binding order.
    pub fn audio_bindings(&self) -> &[AudioBinding] {
        &self.bindings
    }

    /// Credential the media runtime uses to join the room as this agent.
    pub fn agent_token(&self) -> Option<&str> {
        self.agent_token.as_deref()
    }

    pub(crate) fn set_agent_token(&mut self, token: String) {
        self.agent_token = Some(token);
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("state", &self.state)
            .field("room_name", &self.room_name)
            .field("bindings", &self.bindings)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
