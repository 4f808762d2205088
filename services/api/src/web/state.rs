//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-session handles.

use crate::config::Config;
use protein_designer_core::ports::{Clock, PortError, PortResult, RandomSource};
use protein_designer_core::{DesignerSession, GenerationWorkflow, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn RandomSource>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Arc<Config>, clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            config,
            clock,
            rng,
            sessions: SessionRegistry::default(),
        }
    }

    /// Builds a fresh designer session for `user`, with its own workflow.
    pub fn new_designer(&self, user: User) -> DesignerSession {
        let workflow = GenerationWorkflow::new(self.clock.clone(), self.rng.clone())
            .with_timings(self.config.timings);
        DesignerSession::new(user, workflow)
    }
}

//=========================================================================================
// SessionHandle (Specific to One Designer Session)
//=========================================================================================

/// The session's most recent background run.
#[derive(Default)]
pub struct RunningTask {
    /// A token to cancel the generation task that is currently running.
    pub cancellation_token: CancellationToken,
    pub handle: Option<JoinHandle<()>>,
}

/// A designer session plus its background run.
pub struct SessionHandle {
    pub designer: Arc<DesignerSession>,
    /// Held across submit-and-spawn and across cancel-and-join, so a start and a
    /// stop on the same session never interleave.
    pub task: Mutex<RunningTask>,
}

impl SessionHandle {
    pub fn new(designer: DesignerSession) -> Self {
        Self {
            designer: Arc::new(designer),
            task: Mutex::new(RunningTask::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.designer.id()
    }
}

//=========================================================================================
// SessionRegistry
//=========================================================================================

/// In-memory index of live sessions. Nothing survives a restart.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, designer: DesignerSession) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle::new(designer));
        self.sessions
            .write()
            .await
            .insert(handle.id(), handle.clone());
        handle
    }

    pub async fn get(&self, session_id: Uuid) -> PortResult<Arc<SessionHandle>> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("session {}", session_id)))
    }

    /// Drops the session from the index. Stopping its run is up to the caller.
    pub async fn remove(&self, session_id: Uuid) -> PortResult<Arc<SessionHandle>> {
        self.sessions
            .write()
            .await
            .remove(&session_id)
            .ok_or_else(|| PortError::NotFound(format!("session {}", session_id)))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
