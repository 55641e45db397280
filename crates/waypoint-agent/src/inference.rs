//! Reply generation through the hosted inference gateway.
//!
//! The gateway fronts the STT/LLM/TTS backends named in a session's
//! configuration. This module owns only the request/response seam; model
//! execution, audio synthesis, and streaming all happen on the other side
//! of it.

use crate::error::AgentError;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// A request for the agent to generate one spoken reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRequest {
    /// Natural-language instructions steering this specific reply.
    pub instructions: String,
    /// Whether the caller may barge in while the reply is being spoken.
    pub allow_interruptions: bool,
}

/// Seam to the language-generation backend.
///
/// Production uses [`InferenceClient`]; tests substitute a recording fake.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Requests generation of a reply from the named model.
    ///
    /// Returns once the generation request is accepted. Audio delivery is
    /// the media runtime's concern, not the caller's.
    async fn generate_reply(&self, model: &str, request: ReplyRequest) -> Result<(), AgentError>;
}

/// HTTP client for the hosted inference gateway.
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl InferenceClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct GenerateReplyBody<'a> {
    model: &'a str,
    instructions: &'a str,
    allow_interruptions: bool,
}

#[async_trait]
impl ReplyGenerator for InferenceClient {
    async fn generate_reply(&self, model: &str, request: ReplyRequest) -> Result<(), AgentError> {
        let url = format!("{}/v1/replies", self.base_url.trim_end_matches('/'));
        debug!(%model, allow_interruptions = request.allow_interruptions, "requesting reply generation");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&GenerateReplyBody {
                model,
                instructions: &request.instructions,
                allow_interruptions: request.allow_interruptions,
            })
            .send()
            .await
            .map_err(|e| AgentError::Inference(format!("request failed: {}", e)))?;

        response
            .error_for_status()
            .map_err(|e| AgentError::Inference(format!("gateway rejected reply request: {}", e)))?;

        Ok(())
    }
}
