//! Waypoint worker binary — hosts the career-guidance voice agent.
//!
//! Startup order matters: `.env` and configuration first, then tracing,
//! then VAD warm-up, and only after warm-up succeeds does the dispatch
//! listener bind. No job can observe an unpopulated VAD handle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use waypoint_agent::{AgentDeps, BackendSelection, InferenceClient, RoomService};
use waypoint_worker::config;
use waypoint_worker::server::{app, AppState};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("WAYPOINT_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    // Credentials for LiveKit and the inference gateway come from .env in
    // development; missing file is fine in production.
    dotenvy::dotenv().ok();

    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("waypoint.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the worker cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        agent = config.agent.name,
        "resolved startup configuration path"
    );

    // Warm-up: the worker cannot serve calls without VAD, so failure here
    // is fatal and there is no retry.
    let warmed = waypoint_agent::prewarm(&config.agent.vad_model_path)
        .expect("failed to load VAD model — check agent.vad_model_path in config");

    let generator = Arc::new(InferenceClient::new(
        config.inference.url.clone(),
        config.inference.api_key.clone(),
    ));

    let deps = AgentDeps {
        vad: warmed.vad,
        generator,
        backends: BackendSelection {
            stt: config.agent.stt.clone(),
            llm: config.agent.llm.clone(),
            tts: config.agent.tts.clone(),
            turn_detector: config.agent.turn_detector,
            preemptive_generation: config.agent.preemptive_generation,
        },
    };

    let rooms = Arc::new(RoomService::new(config.livekit.clone()));

    let state = AppState {
        deps,
        rooms,
        agent_name: config.agent.name.clone(),
        sessions: Arc::new(RwLock::new(HashMap::new())),
        job_counter: Arc::new(AtomicU64::new(0)),
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting waypoint worker");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("waypoint worker shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
