//! Worker configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use waypoint_agent::LiveKitConfig;
use waypoint_types::{LlmBackend, SttBackend, TtsBackend, TurnDetector};

/// Top-level worker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Dispatch server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// LiveKit deployment credentials.
    #[serde(default)]
    pub livekit: LiveKitConfig,

    /// Hosted inference gateway settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Agent persona and capability backend selections.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the dispatch server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Inference gateway connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the gateway.
    #[serde(default)]
    pub url: String,

    /// Bearer credential for the gateway.
    #[serde(default)]
    pub api_key: String,
}

/// The one agent this worker hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    /// Agent name used for its room identity.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Speech-to-text backend.
    #[serde(default)]
    pub stt: SttBackend,

    /// Language-generation backend.
    #[serde(default)]
    pub llm: LlmBackend,

    /// Speech-synthesis backend.
    #[serde(default)]
    pub tts: TtsBackend,

    /// Turn-detection strategy.
    #[serde(default)]
    pub turn_detector: TurnDetector,

    /// Path to the VAD model loaded at warm-up.
    #[serde(default = "default_vad_model_path")]
    pub vad_model_path: String,

    /// Generate replies speculatively before the user finishes speaking.
    #[serde(default = "default_preemptive")]
    pub preemptive_generation: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "waypoint_worker=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8089
}

fn default_agent_name() -> String {
    "Avery".to_string()
}

fn default_vad_model_path() -> String {
    "models/silero-vad.onnx".to_string()
}

fn default_preemptive() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            stt: SttBackend::default(),
            llm: LlmBackend::default(),
            tts: TtsBackend::default(),
            turn_detector: TurnDetector::default(),
            vad_model_path: default_vad_model_path(),
            preemptive_generation: default_preemptive(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `WAYPOINT_HOST` overrides `server.host`
/// - `WAYPOINT_PORT` overrides `server.port`
/// - `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET` override `livekit.*`
/// - `WAYPOINT_INFERENCE_URL`, `WAYPOINT_INFERENCE_API_KEY` override `inference.*`
/// - `WAYPOINT_VAD_MODEL_PATH` overrides `agent.vad_model_path`
/// - `WAYPOINT_LOG_LEVEL` overrides `logging.level`
/// - `WAYPOINT_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("WAYPOINT_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("WAYPOINT_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(url) = std::env::var("LIVEKIT_URL") {
        config.livekit.url = url;
    }
    if let Ok(key) = std::env::var("LIVEKIT_API_KEY") {
        config.livekit.api_key = key;
    }
    if let Ok(secret) = std::env::var("LIVEKIT_API_SECRET") {
        config.livekit.api_secret = secret;
    }
    if let Ok(url) = std::env::var("WAYPOINT_INFERENCE_URL") {
        config.inference.url = url;
    }
    if let Ok(key) = std::env::var("WAYPOINT_INFERENCE_API_KEY") {
        config.inference.api_key = key;
    }
    if let Ok(path) = std::env::var("WAYPOINT_VAD_MODEL_PATH") {
        config.agent.vad_model_path = path;
    }
    if let Ok(level) = std::env::var("WAYPOINT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("WAYPOINT_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
