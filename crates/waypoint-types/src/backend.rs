//! Capability backend descriptors.
//!
//! Each struct names a hosted backend filling one of the session's
//! capability slots. These are configuration values only; the services they
//! point at are reached through the inference gateway, never implemented
//! here. Defaults reproduce the production agent's selections.

use serde::{Deserialize, Serialize};

/// Streaming speech-to-text backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SttBackend {
    /// Hosted model identifier (`provider/model`).
    #[serde(default = "default_stt_model")]
    pub model: String,
    /// Transcription locale, pinned to a single language.
    #[serde(default = "default_language")]
    pub language: String,
}

/// Language-generation backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmBackend {
    /// Hosted model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,
}

/// Speech-synthesis backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsBackend {
    /// Hosted model identifier (`provider/model`).
    #[serde(default = "default_tts_model")]
    pub model: String,
    /// Voice identity within the model.
    #[serde(default = "default_tts_voice")]
    pub voice: String,
    /// Synthesis locale.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_stt_model() -> String {
    "assemblyai/universal-streaming".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_tts_model() -> String {
    "cartesia/sonic-3".to_string()
}

fn default_tts_voice() -> String {
    "9626c31c-bec5-4cca-baa8-f8ba9e84c8bc".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for SttBackend {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            language: default_language(),
        }
    }
}

impl Default for LlmBackend {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
        }
    }
}

impl Default for TtsBackend {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            voice: default_tts_voice(),
            language: default_language(),
        }
    }
}
