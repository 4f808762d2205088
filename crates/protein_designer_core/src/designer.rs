//! crates/protein_designer_core/src/designer.rs
//!
//! One user's designer context: their entitlement, the job they are looking at,
//! and whether a generation is currently running.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DesignForm, GenerationJob, JobStatus, ProteinDesign, ProteinParameters, User, UserUpdate,
};
use crate::entitlement::EntitlementTracker;
use crate::ports::JobObserver;
use crate::validation::{validate, ValidationError};
use crate::workflow::{GenerationError, GenerationWorkflow};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Invalid submission: {0}")]
    Invalid(#[from] ValidationError),
    #[error("Generation quota exhausted")]
    QuotaExhausted,
    #[error("A generation is already running")]
    AlreadyGenerating,
    #[error("No submitted job is waiting to run")]
    NothingSubmitted,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A submitted job waiting for [`DesignerSession::run`].
struct Submission {
    job: GenerationJob,
    parameters: ProteinParameters,
}

struct SessionState {
    tracker: EntitlementTracker,
    current_job: Option<GenerationJob>,
    submission: Option<Submission>,
    /// The job that holds the busy flag, if any.
    active_job: Option<Uuid>,
}

pub struct DesignerSession {
    id: Uuid,
    workflow: GenerationWorkflow,
    state: Mutex<SessionState>,
}

impl DesignerSession {
    pub fn new(user: User, workflow: GenerationWorkflow) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow,
            state: Mutex::new(SessionState {
                tracker: EntitlementTracker::new(user),
                current_job: None,
                submission: None,
                active_job: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user(&self) -> User {
        self.state().tracker.user().clone()
    }

    pub fn can_generate(&self) -> bool {
        self.state().tracker.can_generate()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.state().tracker.remaining()
    }

    pub fn update_user(&self, update: UserUpdate) {
        self.state().tracker.update(update);
    }

    pub fn is_generating(&self) -> bool {
        self.state().active_job.is_some()
    }

    pub fn current_job(&self) -> Option<GenerationJob> {
        self.state().current_job.clone()
    }

    /// Gates a submission and, if it passes, creates its pending job.
    ///
    /// Checks run in order: validation, quota, busy flag. Nothing is mutated
    /// unless all three pass.
    pub fn submit(&self, form: &DesignForm) -> Result<Uuid, SubmitError> {
        let request = validate(form)?;

        let mut state = self.state();
        if !state.tracker.can_generate() {
            return Err(SubmitError::QuotaExhausted);
        }
        if state.active_job.is_some() {
            return Err(SubmitError::AlreadyGenerating);
        }

        let job = self.workflow.open_job(&request.description);
        let job_id = job.id;
        state.current_job = Some(job.clone());
        state.submission = Some(Submission {
            job,
            parameters: request.parameters,
        });
        state.active_job = Some(job_id);

        info!(session_id = %self.id, job_id = %job_id, "Generation submitted");
        Ok(job_id)
    }

    /// Runs the submitted job. A completed run counts against the quota; a
    /// failed or cancelled one does not.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ProteinDesign, SubmitError> {
        let (submission, user_id) = {
            let mut state = self.state();
            let submission = state.submission.take().ok_or(SubmitError::NothingSubmitted)?;
            (submission, state.tracker.user().id)
        };
        let job_id = submission.job.id;

        let outcome = self
            .workflow
            .execute(submission.job, user_id, &submission.parameters, self, cancel)
            .await;

        let mut state = self.state();
        if state.active_job == Some(job_id) {
            state.active_job = None;
        }
        match outcome {
            Ok(design) => {
                state.tracker.record_generation();
                Ok(design)
            }
            Err(GenerationError::Busy) => {
                // The workflow never saw this job, so close it out here.
                warn!(session_id = %self.id, job_id = %job_id, "Workflow busy, job rejected");
                if let Some(job) = state.current_job.as_mut().filter(|j| j.id == job_id) {
                    job.status = JobStatus::Failed;
                    job.error = Some(GenerationError::Busy.to_string());
                }
                Err(GenerationError::Busy.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submits `form` and runs it to completion.
    pub async fn generate(
        &self,
        form: &DesignForm,
        cancel: &CancellationToken,
    ) -> Result<ProteinDesign, SubmitError> {
        self.submit(form)?;
        self.run(cancel).await
    }

    /// Forgets the current job and releases the busy flag. A run that is still
    /// in flight keeps going but its updates are no longer shown.
    pub fn clear_job(&self) {
        let mut state = self.state();
        state.current_job = None;
        state.submission = None;
        state.active_job = None;
    }
}

impl JobObserver for DesignerSession {
    fn publish(&self, job: &GenerationJob) {
        let mut state = self.state();
        if let Some(current) = state.current_job.as_mut().filter(|j| j.id == job.id) {
            *current = job.clone();
        }
    }
}
