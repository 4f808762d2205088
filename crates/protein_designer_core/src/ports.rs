//! crates/protein_designer_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, so the workflow
//! never touches a real timer or random number generator directly and tests can
//! drive it deterministically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::{GenerationJob, GenerationPhase};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for port operations implemented by adapters.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Source of time for the workflow: simulated latency and timestamps.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for `duration`. This is a cooperative yield point.
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> DateTime<Utc>;
}

/// Source of pseudo-randomness for sequence selection, padding and scores.
pub trait RandomSource: Send + Sync {
    /// Returns an index uniformly drawn from `0..len`. `len` is never zero.
    fn next_index(&self, len: usize) -> usize;

    /// Returns a value uniformly drawn from `[0, 1)`.
    fn next_unit(&self) -> f64;
}

/// Optional hook consulted before each phase. Returning a message fails the job.
pub trait FaultInjector: Send + Sync {
    fn inject(&self, phase: GenerationPhase) -> Option<String>;
}

/// Receives a snapshot of the job every time its status changes.
pub trait JobObserver: Send + Sync {
    fn publish(&self, job: &GenerationJob);
}

/// Observer for callers that do not track progress.
pub struct NoopObserver;

impl JobObserver for NoopObserver {
    fn publish(&self, _job: &GenerationJob) {}
}
