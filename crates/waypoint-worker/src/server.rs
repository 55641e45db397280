//! HTTP dispatch surface for the worker.
//!
//! LiveKit-side dispatch hands jobs to the worker as `POST /agent/dispatch`
//! requests naming a room. The handler snapshots the room, assembles a
//! session through the agent entrypoint, and returns once the session has
//! started; the session then stays open for further turns.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use waypoint_agent::{entrypoint, AgentDeps, AgentError, AgentSession, JobContext, RoomDirectory};
use waypoint_types::{NoiseCancellation, ParticipantKind};

/// Slot in the session map: a dispatch claim or a started session.
///
/// A room is claimed with [`SessionSlot::Pending`] before any side effect
/// runs, so a racing dispatch for the same room is rejected before it can
/// reach the inference gateway.
#[derive(Debug)]
pub enum SessionSlot {
    /// Room claimed by an in-flight dispatch.
    Pending,
    /// Started session serving the room.
    Active(AgentSession),
}

impl SessionSlot {
    /// The started session, if this slot holds one.
    pub fn session(&self) -> Option<&AgentSession> {
        match self {
            Self::Active(session) => Some(session),
            Self::Pending => None,
        }
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Dependencies injected into every job entrypoint.
    pub deps: AgentDeps,
    /// Room lookup and token issuance.
    pub rooms: Arc<dyn RoomDirectory>,
    /// Name the agent joins rooms under.
    pub agent_name: String,
    /// Sessions keyed by room name, alive from dispatch claim to teardown.
    pub sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
    /// Source for generated job ids.
    pub job_counter: Arc<AtomicU64>,
}

/// Errors returned by the dispatch API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::RoomService(_) | AgentError::Inference(_) => {
                ApiError::Upstream(err.to_string())
            }
            AgentError::AlreadyStarted => ApiError::Conflict(err.to_string()),
            _ => ApiError::InternalServerError(err.to_string()),
        }
    }
}

/// Request body for `POST /agent/dispatch`.
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    /// Room to attach the agent to.
    pub room: String,
    /// Dispatcher-assigned job id; generated when absent.
    #[serde(default)]
    pub job_id: Option<String>,
}

/// One participant's recorded audio-input binding.
#[derive(Debug, Serialize, Deserialize)]
pub struct BindingSummary {
    pub identity: String,
    pub kind: ParticipantKind,
    pub noise_cancellation: NoiseCancellation,
}

/// Response body for a successful dispatch.
#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub job_id: String,
    pub room: String,
    pub agent: String,
    pub bindings: Vec<BindingSummary>,
}

/// Health check handler.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "agent": state.agent_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for `POST /agent/dispatch`.
///
/// Claims the room in the session map before anything else runs, so two
/// dispatches racing on the same room cannot both reach the entrypoint; the
/// loser gets a conflict before any greeting fires. Returns after the
/// session has started; greeting and subsequent turns run inside the
/// started session.
async fn dispatch_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    if payload.room.trim().is_empty() {
        return Err(ApiError::BadRequest("room must not be empty".to_string()));
    }

    {
        let mut sessions = state
            .sessions
            .write()
            .map_err(|_| ApiError::InternalServerError("session map poisoned".to_string()))?;
        match sessions.entry(payload.room.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => {
                return Err(ApiError::Conflict(format!(
                    "agent already serving room '{}'",
                    payload.room
                )));
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(SessionSlot::Pending);
            }
        }
    }

    let job_id = payload.job_id.clone().unwrap_or_else(|| {
        format!("job-{}", state.job_counter.fetch_add(1, Ordering::Relaxed) + 1)
    });

    let session = match start_session(&state, &payload.room, &job_id).await {
        Ok(session) => session,
        Err(err) => {
            // Release the claim so the room can be dispatched again.
            if let Ok(mut sessions) = state.sessions.write() {
                sessions.remove(&payload.room);
            }
            return Err(err);
        }
    };

    let bindings = session
        .audio_bindings()
        .iter()
        .map(|b| BindingSummary {
            identity: b.identity.clone(),
            kind: b.kind,
            noise_cancellation: b.cancellation,
        })
        .collect();

    let response = DispatchResponse {
        job_id,
        room: payload.room.clone(),
        agent: state.agent_name.clone(),
        bindings,
    };

    let mut sessions = state
        .sessions
        .write()
        .map_err(|_| ApiError::InternalServerError("session map poisoned".to_string()))?;
    // Only this handler can upgrade the claim it holds; teardown refuses
    // to remove a pending slot.
    sessions.insert(payload.room, SessionSlot::Active(session));

    Ok(Json(response))
}

/// Fetches the room, mints the agent token, and runs the job entrypoint.
async fn start_session(
    state: &AppState,
    room_name: &str,
    job_id: &str,
) -> Result<AgentSession, ApiError> {
    let room = state.rooms.fetch_room(room_name).await?;
    let identity = format!("agent-{}", state.agent_name.to_lowercase());
    let agent_token = state.rooms.agent_token(room.name(), &identity)?;

    tracing::info!(%job_id, room = room.name(), "dispatching job to agent");

    let ctx = JobContext {
        job_id: job_id.to_string(),
        room,
        agent_token: Some(agent_token),
    };
    Ok(entrypoint(ctx, &state.deps).await?)
}

/// Handler for `DELETE /agent/dispatch/{room}`.
///
/// Ends the call: drops the room's session so a later dispatch can serve
/// the room again.
async fn teardown_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = state
        .sessions
        .write()
        .map_err(|_| ApiError::InternalServerError("session map poisoned".to_string()))?;
    match sessions.get(&room) {
        Some(SessionSlot::Active(_)) => {
            sessions.remove(&room);
            tracing::info!(%room, "agent session ended");
            Ok(Json(serde_json::json!({ "room": room, "status": "ended" })))
        }
        Some(SessionSlot::Pending) => Err(ApiError::Conflict(format!(
            "dispatch in progress for room '{}'",
            room
        ))),
        None => Err(ApiError::NotFound(format!(
            "no session for room '{}'",
            room
        ))),
    }
}

/// Builds the dispatch router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agent/dispatch", post(dispatch_handler))
        .route("/agent/dispatch/{room}", delete(teardown_handler))
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use livekit_protocol::{participant_info, ParticipantInfo};
    use std::io::Write;
    use tower::ServiceExt;
    use waypoint_agent::{BackendSelection, ReplyGenerator, ReplyRequest, RoomHandle};

    #[derive(Default)]
    struct RecordingGenerator {
        calls: std::sync::Mutex<Vec<ReplyRequest>>,
        delay: Option<std::time::Duration>,
    }

    #[async_trait]
    impl ReplyGenerator for RecordingGenerator {
        async fn generate_reply(
            &self,
            _model: &str,
            request: ReplyRequest,
        ) -> Result<(), AgentError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push(request);
            Ok(())
        }
    }

    struct FakeDirectory {
        rooms: HashMap<String, Vec<ParticipantInfo>>,
    }

    #[async_trait]
    impl RoomDirectory for FakeDirectory {
        async fn fetch_room(&self, name: &str) -> Result<RoomHandle, AgentError> {
            self.rooms
                .get(name)
                .map(|participants| RoomHandle::new(name, participants.clone()))
                .ok_or_else(|| AgentError::RoomService(format!("room '{}' not found", name)))
        }

        fn agent_token(&self, _room_name: &str, _identity: &str) -> Result<String, AgentError> {
            Ok("test-token".to_string())
        }
    }

    fn participant(identity: &str, kind: participant_info::Kind) -> ParticipantInfo {
        ParticipantInfo {
            identity: identity.to_string(),
            kind: kind as i32,
            ..Default::default()
        }
    }

    fn test_state(
        rooms: HashMap<String, Vec<ParticipantInfo>>,
    ) -> (AppState, tempfile::NamedTempFile, Arc<RecordingGenerator>) {
        test_state_with(rooms, Arc::new(RecordingGenerator::default()))
    }

    fn test_state_with(
        rooms: HashMap<String, Vec<ParticipantInfo>>,
        generator: Arc<RecordingGenerator>,
    ) -> (AppState, tempfile::NamedTempFile, Arc<RecordingGenerator>) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"vad-model").unwrap();
        file.flush().unwrap();

        let warmed = waypoint_agent::prewarm(file.path()).unwrap();

        let state = AppState {
            deps: AgentDeps {
                vad: warmed.vad,
                generator: generator.clone(),
                backends: BackendSelection::default(),
            },
            rooms: Arc::new(FakeDirectory { rooms }),
            agent_name: "Avery".to_string(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            job_counter: Arc::new(AtomicU64::new(0)),
        };

        (state, file, generator)
    }

    fn dispatch_request(room: &str) -> Request<Body> {
        Request::builder()
            .uri("/agent/dispatch")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "room": room }).to_string(),
            ))
            .unwrap()
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let (state, _vad, _gen) = test_state(HashMap::new());
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["agent"], "Avery");
    }

    #[tokio::test]
    async fn dispatch_starts_session_with_standard_cancellation() {
        let mut rooms = HashMap::new();
        rooms.insert(
            "web-call".to_string(),
            vec![participant("browser-user", participant_info::Kind::Standard)],
        );
        let (state, _vad, generator) = test_state(rooms);
        let sessions = state.sessions.clone();
        let app = app(state);

        let response = app.oneshot(dispatch_request("web-call")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["room"], "web-call");
        assert_eq!(json["job_id"], "job-1");
        assert_eq!(json["bindings"][0]["identity"], "browser-user");
        assert_eq!(json["bindings"][0]["noise_cancellation"], "standard");

        // Session stays open after the handler returns, with one greeting issued.
        let sessions = sessions.read().unwrap();
        let session = sessions.get("web-call").unwrap().session().unwrap();
        assert!(session.is_started());
        assert_eq!(session.agent_token(), Some("test-token"));

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].allow_interruptions);
    }

    #[tokio::test]
    async fn dispatch_selects_telephony_cancellation_for_sip() {
        let mut rooms = HashMap::new();
        rooms.insert(
            "phone-call".to_string(),
            vec![participant("pstn-caller", participant_info::Kind::Sip)],
        );
        let (state, _vad, _gen) = test_state(rooms);
        let app = app(state);

        let response = app.oneshot(dispatch_request("phone-call")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["bindings"][0]["noise_cancellation"], "telephony");
        assert_eq!(json["bindings"][0]["kind"], "sip");
    }

    #[tokio::test]
    async fn dispatching_the_same_room_twice_conflicts() {
        let mut rooms = HashMap::new();
        rooms.insert("call".to_string(), vec![]);
        let (state, _vad, _gen) = test_state(rooms);
        let app = app(state);

        let first = app
            .clone()
            .oneshot(dispatch_request("call"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(dispatch_request("call")).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn dispatch_to_unknown_room_is_bad_gateway() {
        let (state, _vad, _gen) = test_state(HashMap::new());
        let app = app(state);

        let response = app.oneshot(dispatch_request("missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn dispatch_with_empty_room_is_rejected() {
        let (state, _vad, _gen) = test_state(HashMap::new());
        let app = app(state);

        let response = app.oneshot(dispatch_request("  ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    fn teardown_request(room: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/agent/dispatch/{}", room))
            .method("DELETE")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn teardown_frees_the_room_for_redispatch() {
        let mut rooms = HashMap::new();
        rooms.insert("call".to_string(), vec![]);
        let (state, _vad, _gen) = test_state(rooms);
        let sessions = state.sessions.clone();
        let app = app(state);

        let first = app
            .clone()
            .oneshot(dispatch_request("call"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let ended = app
            .clone()
            .oneshot(teardown_request("call"))
            .await
            .unwrap();
        assert_eq!(ended.status(), StatusCode::OK);
        let json = response_json(ended).await;
        assert_eq!(json["status"], "ended");
        assert!(sessions.read().unwrap().is_empty());

        // The room is free again; a fresh dispatch gets a new job.
        let second = app.oneshot(dispatch_request("call")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let json = response_json(second).await;
        assert_eq!(json["job_id"], "job-2");
    }

    #[tokio::test]
    async fn teardown_of_unknown_room_is_not_found() {
        let (state, _vad, _gen) = test_state(HashMap::new());
        let app = app(state);

        let response = app.oneshot(teardown_request("ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn racing_dispatches_for_one_room_greet_once() {
        let mut rooms = HashMap::new();
        rooms.insert("call".to_string(), vec![]);
        // The slow greeting keeps the first dispatch in flight while the
        // second one arrives.
        let generator = Arc::new(RecordingGenerator {
            calls: std::sync::Mutex::new(Vec::new()),
            delay: Some(std::time::Duration::from_millis(50)),
        });
        let (state, _vad, generator) = test_state_with(rooms, generator);
        let app = app(state);

        let (first, second) = tokio::join!(
            app.clone().oneshot(dispatch_request("call")),
            app.clone().oneshot(dispatch_request("call")),
        );
        let statuses = [first.unwrap().status(), second.unwrap().status()];

        assert!(statuses.contains(&StatusCode::OK));
        assert!(statuses.contains(&StatusCode::CONFLICT));
        assert_eq!(generator.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_dispatch_releases_the_room() {
        // First attempt targets a room the directory cannot resolve yet.
        let (state, _vad, _gen) = test_state(HashMap::new());
        let sessions = state.sessions.clone();
        let app = app(state);

        let response = app
            .clone()
            .oneshot(dispatch_request("call"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(sessions.read().unwrap().is_empty());
    }
}
