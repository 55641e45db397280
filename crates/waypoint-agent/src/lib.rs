//! Voice agent assembly for the Waypoint platform.
//!
//! Wires a single conversational agent together from five capability slots
//! (speech-to-text, language generation, speech synthesis, turn detection,
//! voice-activity detection) and attaches it to a LiveKit room with
//! per-participant noise-cancellation selection.
//!
//! The hard problems all live elsewhere: audio transport is LiveKit's,
//! model inference is the hosted gateway's, and the DSP modules are opaque.
//! What this crate owns is the one contract the worker establishes — the
//! shape of a session configuration and its startup sequence:
//!
//! 1. [`prewarm`] loads the VAD model once per process.
//! 2. [`entrypoint`] assembles a [`SessionConfig`] per job from injected
//!    [`AgentDeps`] and starts an [`AgentSession`] in the job's room.
//! 3. The [`Persona`] greets the caller exactly once when the session
//!    becomes active.

pub mod entrypoint;
pub mod error;
pub mod inference;
pub mod persona;
pub mod room;
pub mod session;
pub mod vad;

pub use entrypoint::{entrypoint, AgentDeps, BackendSelection, JobContext};
pub use error::AgentError;
pub use inference::{InferenceClient, ReplyGenerator, ReplyRequest};
pub use persona::Persona;
pub use room::{
    participant_kind, AudioInputOptions, LiveKitConfig, RoomDirectory, RoomHandle, RoomOptions,
    RoomService,
};
pub use session::{AgentSession, AudioBinding, SessionConfig, SessionConfigBuilder};
pub use vad::{prewarm, Prewarmed, VadModel};
