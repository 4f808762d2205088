//! Deterministic port implementations shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::domain::{GenerationJob, GenerationPhase, JobStatus};
use crate::ports::{Clock, FaultInjector, JobObserver, RandomSource};

/// A clock whose sleeps return immediately, recording what was requested.
/// With a gate, every sleep instead waits until the gate is opened.
#[derive(Default)]
pub struct InstantClock {
    pub sleeps: Mutex<Vec<Duration>>,
    gate: Option<CancellationToken>,
}

impl InstantClock {
    pub fn gated(gate: CancellationToken) -> Self {
        Self {
            sleeps: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        if let Some(gate) = &self.gate {
            gate.cancelled().await;
        }
    }

    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }
}

/// Replays scripted draws; falls back to zero once a script runs out.
#[derive(Default)]
pub struct ScriptedRandom {
    indices: Mutex<VecDeque<usize>>,
    units: Mutex<VecDeque<f64>>,
}

impl ScriptedRandom {
    pub fn new(indices: &[usize], units: &[f64]) -> Self {
        Self {
            indices: Mutex::new(indices.iter().copied().collect()),
            units: Mutex::new(units.iter().copied().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&self, len: usize) -> usize {
        self.indices.lock().unwrap().pop_front().unwrap_or(0) % len
    }

    fn next_unit(&self) -> f64 {
        self.units.lock().unwrap().pop_front().unwrap_or(0.0)
    }
}

/// Keeps every published snapshot in order.
#[derive(Default)]
pub struct RecordingObserver {
    pub snapshots: Mutex<Vec<GenerationJob>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.snapshots.lock().unwrap().iter().map(|j| j.status).collect()
    }
}

impl JobObserver for RecordingObserver {
    fn publish(&self, job: &GenerationJob) {
        self.snapshots.lock().unwrap().push(job.clone());
    }
}

/// Fails the given phase with a fixed message.
pub struct FailAt(pub GenerationPhase);

impl FaultInjector for FailAt {
    fn inject(&self, phase: GenerationPhase) -> Option<String> {
        (phase == self.0).then(|| "backend unavailable".to_string())
    }
}
