//! services/api/src/web/generation_task.rs
//!
//! This module contains the asynchronous "worker" that runs a submitted
//! generation in the background while clients poll for its status.

use crate::web::state::SessionHandle;
use protein_designer_core::{DesignForm, GenerationError, SubmitError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Gates `form` through the session and, if accepted, spawns the run.
///
/// Returns as soon as the pending job exists; the run itself continues on its
/// own task.
pub async fn start_generation(
    session: Arc<SessionHandle>,
    form: &DesignForm,
) -> Result<Uuid, SubmitError> {
    let mut task = session.task.lock().await;
    let job_id = session.designer.submit(form)?;

    let cancellation_token = CancellationToken::new();
    task.cancellation_token = cancellation_token.clone();
    task.handle = Some(tokio::spawn(generation_process(
        session.clone(),
        cancellation_token,
    )));

    Ok(job_id)
}

/// Cancels any running generation, waits for it to wind down and clears the
/// session's job.
pub async fn stop_generation(session: &SessionHandle) {
    let mut task = session.task.lock().await;
    task.cancellation_token.cancel();
    if let Some(handle) = task.handle.take() {
        if let Err(e) = handle.await {
            warn!(session_id = %session.id(), "Generation task ended abnormally: {}", e);
        }
    }
    session.designer.clear_job();
}

/// The background task for one generation run.
pub async fn generation_process(
    session: Arc<SessionHandle>,
    cancellation_token: CancellationToken,
) {
    let session_id = session.id();
    info!(%session_id, "Generation task started.");

    match session.designer.run(&cancellation_token).await {
        Ok(design) => info!(
            %session_id,
            design_id = %design.id,
            length = design.sequence.len(),
            "Generation task finished."
        ),
        Err(SubmitError::Generation(GenerationError::Cancelled)) => {
            info!(%session_id, "Generation task cancelled.")
        }
        Err(e) => error!(%session_id, "Generation task failed: {}", e),
    }
}
