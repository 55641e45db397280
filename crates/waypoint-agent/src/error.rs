use thiserror::Error;

/// Errors surfaced by agent assembly and session startup.
///
/// Capability backend failures are not retried or recovered here; they
/// propagate to the dispatcher, which owns logging and job-level failure.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("room service error: {0}")]
    RoomService(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("VAD error: {0}")]
    Vad(String),

    #[error("inference gateway error: {0}")]
    Inference(String),

    #[error("no backend selected for capability slot: {0}")]
    MissingBackend(&'static str),

    #[error("session already started")]
    AlreadyStarted,

    #[error("session not started")]
    NotStarted,
}
