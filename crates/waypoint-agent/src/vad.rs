//! Voice-activity-detection model loading and process warm-up.
//!
//! The VAD model is loaded from disk exactly once per worker process,
//! before the dispatch listener starts accepting jobs, and then shared
//! read-only across every concurrent session. Inference over the model is
//! the media runtime's job; this module only owns the warm-up contract.

use crate::error::AgentError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A voice-activity-detection model resident in memory.
///
/// Immutable after [`VadModel::load`]. Sessions hold it behind an `Arc`,
/// so a worker process carries exactly one copy regardless of how many
/// calls it is serving.
#[derive(Clone)]
pub struct VadModel {
    path: PathBuf,
    data: Vec<u8>,
}

impl std::fmt::Debug for VadModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VadModel")
            .field("path", &self.path)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

impl VadModel {
    /// Loads the model file at `path` into memory.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AgentError> {
        let path = path.into();
        let data = std::fs::read(&path)
            .map_err(|e| AgentError::Vad(format!("failed to read model {:?}: {}", path, e)))?;

        if data.is_empty() {
            return Err(AgentError::Vad(format!("model file {:?} is empty", path)));
        }

        Ok(Self { path, data })
    }

    /// Path the model was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the loaded model in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Resources warmed up once per worker process.
///
/// Replaces an ambient process-global cache: the warmed state is an explicit
/// value, injected into each job's entrypoint by the dispatcher.
#[derive(Debug, Clone)]
pub struct Prewarmed {
    /// The shared voice-activity detector. Read-only after warm-up.
    pub vad: Arc<VadModel>,
}

/// Loads the VAD model and returns the process-wide warm state.
///
/// Invoked once before any job is accepted. Failure is fatal to the worker;
/// there is no retry because a worker without VAD cannot serve calls.
pub fn prewarm(vad_model_path: impl Into<PathBuf>) -> Result<Prewarmed, AgentError> {
    let model = VadModel::load(vad_model_path)?;
    info!(
        path = ?model.path(),
        size_bytes = model.size_bytes(),
        "VAD model loaded"
    );

    Ok(Prewarmed {
        vad: Arc::new(model),
    })
}
