//! Per-job session assembly.
//!
//! The dispatcher calls [`entrypoint`] once per incoming job with an
//! explicit dependency bundle. Exactly one persona and one session
//! configuration exist per job; the VAD handle inside [`AgentDeps`] is the
//! process-shared one from warm-up.

use crate::error::AgentError;
use crate::inference::ReplyGenerator;
use crate::persona::Persona;
use crate::room::{RoomHandle, RoomOptions};
use crate::session::{AgentSession, SessionConfig};
use crate::vad::VadModel;
use std::sync::Arc;
use tracing::info;
use waypoint_types::{LlmBackend, SttBackend, TtsBackend, TurnDetector};

/// The capability backends a worker is configured to assemble sessions from.
#[derive(Debug, Clone)]
pub struct BackendSelection {
    pub stt: SttBackend,
    pub llm: LlmBackend,
    pub tts: TtsBackend,
    pub turn_detector: TurnDetector,
    pub preemptive_generation: bool,
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self {
            stt: SttBackend::default(),
            llm: LlmBackend::default(),
            tts: TtsBackend::default(),
            turn_detector: TurnDetector::default(),
            preemptive_generation: true,
        }
    }
}

/// Dependencies injected into every job entrypoint.
///
/// Built once at worker startup; the VAD handle is shared read-only across
/// all concurrent jobs in the process.
#[derive(Clone)]
pub struct AgentDeps {
    pub vad: Arc<VadModel>,
    pub generator: Arc<dyn ReplyGenerator>,
    pub backends: BackendSelection,
}

impl std::fmt::Debug for AgentDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDeps")
            .field("vad", &self.vad)
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

/// Context for one dispatched job.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: String,
    pub room: RoomHandle,
    /// Join credential for the media runtime, when the dispatcher issued one.
    pub agent_token: Option<String>,
}

/// Assembles and starts an agent session for one job.
///
/// Selects the five capability backends from `deps`, constructs the
/// career-guidance persona, and starts the session in the job's room with
/// default room options (per-kind noise-cancellation selection). Backend
/// selection failures and inference errors propagate to the caller.
pub async fn entrypoint(ctx: JobContext, deps: &AgentDeps) -> Result<AgentSession, AgentError> {
    info!(job_id = %ctx.job_id, room = ctx.room.name(), "assembling agent session");

    let config = SessionConfig::builder()
        .stt(deps.backends.stt.clone())
        .llm(deps.backends.llm.clone())
        .tts(deps.backends.tts.clone())
        .turn_detector(deps.backends.turn_detector)
        .vad(Arc::clone(&deps.vad))
        .preemptive_generation(deps.backends.preemptive_generation)
        .build()?;

    let mut session = AgentSession::new(config, Arc::clone(&deps.generator));
    if let Some(token) = ctx.agent_token {
        session.set_agent_token(token);
    }

    let persona = Persona::career_guide();
    session
        .start(&persona, &ctx.room, RoomOptions::default())
        .await?;

    Ok(session)
}
