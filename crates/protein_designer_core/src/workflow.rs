//! crates/protein_designer_core/src/workflow.rs
//!
//! The simulated generation pipeline. No inference happens here: a run waits
//! through two fixed phases, picks a canned sequence, fits it to the requested
//! length and attaches a fabricated confidence score.

use futures::future::{self, Either};
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{GenerationJob, GenerationPhase, JobStatus, ProteinDesign, ProteinParameters};
use crate::ports::{Clock, FaultInjector, JobObserver, RandomSource};

/// The twenty standard amino acids, one letter each.
pub const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

pub const CONFIDENCE_FLOOR: f64 = 85.0;
pub const CONFIDENCE_SPAN: f64 = 10.0;

/// Canned sequences a run picks from.
pub const SEQUENCE_POOL: [&str; 2] = [
    concat!(
        "MKLFWLLFTIGFCWAQYSSNTQQGRTSGIVHVVNLNNYMLPAWYGLNAGGQAMTLHAVVNLINYQDDAELATRAAKDVSH",
        "CFPLYDTSVGKYVFMYNNLFYEHQGSPHQVHSLLLTGVYTPTNQCEKPMVLFTDVKNQPVIIVNFSHGTQGNQCNVGVQT",
        "PWEEEKNSSFMAEAGGAGVDSVVSFNAVIAIQNKIDIYSGTIFDNAAEACGRGLGLGDIAENPPYFQPDDMDMQFEKGFV",
        "SVVVTSRGFYQPVTDSSSRCGAMLSLLVAYAEKYHDPNSFPSSAGTMNYASYSQGCLCVGVAGDAAEAGLGRILVKDSVS",
        "VLLQYGSTDYAEQELTSADGPEVIQGLKWGAVNSQVQSRSADQTIIWGVNLAHGVLSIKQVGVLAGLCDEMSAQPVELLE",
        "ILEDGVLNKNTIEYETVQLQDPLVNVLQVVPAGDLLKIDGTPAYDTKIQAACESPLVSALAYAHMSQMGMSKDVGMPGGL",
        "PMQSQMPIGRQKRSAVGMVAMVGAVYRNQTGDVSLKVKSGAGTDAEVDVSLANAGGSGHNYAPGPSIGTGWEKRKAAIQS",
        "LEEAGQSLCVGTPSTLQTLIRGLGATTLTPITNGSGSLQVGTGQLLVVNAGTQTVCAGLNSGLQTLQPYQGLDPVGIVSR",
        "SSDPTVSCIGLTGSSAQYTDVPGGVGDLYRCSGAAFGNQGLSGVQVATSGGSADRSAASAMDDMMQTVFSCASEPALGCG",
        "LDVQVDHYGLQPVFNLNGDHVYVAKLLLMDQYSGYYVGVVDHVFKQDDEGLQPGVFQGLKAGSAGAYQVYVNGTPKVQGS",
        "QVGLRDGVQLAGNYGSSYLRQTVSFSVDLASRVGDVGVGGVVDGVVVYDGTGSDMGCTGIGLGGGDVQSGLTGLDEAQGG",
        "TPDYPFQCAGLGGAMLSARGVYFQDVVYGLVDGVLDNTKISGVSAGGQFMVFNGVPTLQTVVQTGEDVAGVVTAGVAGGG",
        "IVAGALQNVLKGVMLLQGLGGSQGVVQGVVGGLQGVQGVQGVQGVQGVQ",
    ),
    concat!(
        "MKLKAILFVVGFVCKSLAAEVQEVQGPQGVAGGQAMTLHAVVNLINYQDDAELATRAAKDVSHCFPLYDTSVGKYVFMYN",
        "NLFYEHQGSPHQVHSLLLTGVYTPTNQCEKPMVLFTDVKNQPVIIVNFSHGTQGNQCNVGVQTPWEEEKNSSFMAEAGGA",
        "GVDSVVSFNAVIAIQNKIDIYSGTIFDNAAEACGRGLGLGDIAENPPYFQPDDMDMQFEKGFVSVVVTSRGFYQPVTDSS",
        "SRCGAMLSLLVAYAEKYHDPNSFPSSAGTMNYASYSQGCLCVGVAGDAAEAGLGRILVKDSVSVLLQYGSTDYAEQELTS",
        "ADGPEVIQGLKWGAVNSQVQSRSADQTIIWGVNLAHGVLSIKQVGVLAGLCDEMSAQPVELLEILEDGVLNKNTIEYETV",
        "QLQDPLVNVLQVVPAGDLLKIDGTPAYDTKIQAACESPLVSALAYAHMSQMGMSKDVGMPGGLPMQSQMPIGRQKRSAVG",
        "MVAMVGAVYRNQTGDVSLKVKSGAGTDAEVDVSLANAGGSGHNYAPGPSIGTGWEKRKAAIQSLEEAGQSLCVGTPSTLQ",
        "TLIRGLGATTLTPITNGSGSLQVGTGQLLVVNAGTQTVCAGLNSGLQTLQPYQGLDPVGIVSRSSDPTVSCIGLTGSSAQ",
        "YTDVPGGVGDLYRCSGAAFGNQGLSGVQVATSGGSADRSAASAMDDMMQTVFSCASEPALGCGLDVQVDHYGLQPVFNLN",
        "GDHVYVAKLLLMDQYSGYYVGVVDHVFKQDDEGLQPGVFQGLKAGSAGAYQVYVNGTPKVQGSQVGLRDGVQLAGNYGSS",
        "YLRQTVSFSVDLASRVGDVGVGGVVDGVVVYDGTGSDMGCTGIGLGGGDVQSGLTGLDEAQGGTPDYPFQCAGLGGAMLS",
        "ARGVYFQDVVYGLVDGVLDNTKISGVSAGGQFMVFNGVPTLQTVVQTGEDVAGVVTAGVAGGGIVAGALQNVLKGVMLLQ",
        "GLGGSQGVVQGVVGGLQGVQGVQGVQGVQGVQ",
    ),
];

//=========================================================================================
// Errors and Timings
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("A generation is already in flight")]
    Busy,
    #[error("Generation was cancelled")]
    Cancelled,
    #[error("Generation failed during {phase}: {message}")]
    Faulted {
        phase: GenerationPhase,
        message: String,
    },
}

/// Simulated latency of each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub initialization: Duration,
    pub prediction: Duration,
}

impl PhaseTimings {
    pub fn for_phase(&self, phase: GenerationPhase) -> Duration {
        match phase {
            GenerationPhase::Initialization => self.initialization,
            GenerationPhase::Prediction => self.prediction,
        }
    }
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            initialization: Duration::from_secs(2),
            prediction: Duration::from_secs(3),
        }
    }
}

//=========================================================================================
// The Workflow
//=========================================================================================

/// Runs mock generations. One run at a time per instance; a second call while a
/// run is in flight fails with [`GenerationError::Busy`].
pub struct GenerationWorkflow {
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
    faults: Option<Arc<dyn FaultInjector>>,
    timings: PhaseTimings,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GenerationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| GenerationError::Busy)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl GenerationWorkflow {
    pub fn new(clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            clock,
            rng,
            faults: None,
            timings: PhaseTimings::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_timings(mut self, timings: PhaseTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_fault_injector(mut self, faults: Arc<dyn FaultInjector>) -> Self {
        self.faults = Some(faults);
        self
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Creates a job in the `Pending` state, stamped with the workflow's clock.
    pub fn open_job(&self, description: &str) -> GenerationJob {
        GenerationJob::pending(description, self.clock.now())
    }

    /// Creates a job for `description` and runs it to completion.
    pub async fn generate(
        &self,
        user_id: Uuid,
        description: &str,
        parameters: &ProteinParameters,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> Result<ProteinDesign, GenerationError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        let job = self.open_job(description);
        observer.publish(&job);
        self.run_phases(job, user_id, parameters, observer, cancel).await
    }

    /// Runs a job previously created with [`open_job`](Self::open_job).
    pub async fn execute(
        &self,
        job: GenerationJob,
        user_id: Uuid,
        parameters: &ProteinParameters,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> Result<ProteinDesign, GenerationError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.run_phases(job, user_id, parameters, observer, cancel).await
    }

    async fn run_phases(
        &self,
        mut job: GenerationJob,
        user_id: Uuid,
        parameters: &ProteinParameters,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> Result<ProteinDesign, GenerationError> {
        info!(job_id = %job.id, target_length = parameters.target_length, "Generation started");

        self.suspend(GenerationPhase::Initialization, &mut job, observer, cancel)
            .await?;
        job.status = JobStatus::Processing;
        observer.publish(&job);

        self.suspend(GenerationPhase::Prediction, &mut job, observer, cancel)
            .await?;

        let design = self.fabricate(user_id, &job.description, parameters);
        job.status = JobStatus::Completed;
        job.result = Some(design.clone());
        observer.publish(&job);

        info!(
            job_id = %job.id,
            design_id = %design.id,
            confidence = design.confidence,
            "Generation completed"
        );
        Ok(design)
    }

    /// Waits out one phase. Faults are checked on entry and cancellation on
    /// both sides of the wait.
    async fn suspend(
        &self,
        phase: GenerationPhase,
        job: &mut GenerationJob,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> Result<(), GenerationError> {
        if let Some(message) = self.faults.as_ref().and_then(|f| f.inject(phase)) {
            return Err(fail(job, observer, GenerationError::Faulted { phase, message }));
        }
        if cancel.is_cancelled() {
            return Err(fail(job, observer, GenerationError::Cancelled));
        }

        let sleep = self.clock.sleep(self.timings.for_phase(phase));
        let cancelled = pin!(cancel.cancelled());
        match future::select(sleep, cancelled).await {
            Either::Left(_) if !cancel.is_cancelled() => Ok(()),
            _ => Err(fail(job, observer, GenerationError::Cancelled)),
        }
    }

    fn fabricate(
        &self,
        user_id: Uuid,
        description: &str,
        parameters: &ProteinParameters,
    ) -> ProteinDesign {
        let base = SEQUENCE_POOL[self.rng.next_index(SEQUENCE_POOL.len())];
        let sequence = resize_sequence(base, parameters.target_length as usize, self.rng.as_ref());
        let confidence = confidence_score(self.rng.next_unit());

        ProteinDesign {
            id: Uuid::new_v4(),
            user_id,
            description: description.to_string(),
            target_length: parameters.target_length,
            folding_type: parameters.folding_type,
            stability_preference: parameters.stability_preference,
            solubility_requirement: parameters.solubility_requirement,
            sequence,
            confidence,
            timestamp: self.clock.now(),
            exported: false,
        }
    }
}

fn fail(
    job: &mut GenerationJob,
    observer: &dyn JobObserver,
    error: GenerationError,
) -> GenerationError {
    warn!(job_id = %job.id, error = %error, "Generation failed");
    job.status = JobStatus::Failed;
    job.error = Some(error.to_string());
    observer.publish(job);
    error
}

/// Fits `base` to exactly `target_length` residues: truncates when longer and
/// pads with uniformly drawn amino acids when shorter.
pub fn resize_sequence(base: &str, target_length: usize, rng: &dyn RandomSource) -> String {
    let alphabet = AMINO_ACIDS.as_bytes();
    let mut sequence: String = base.chars().take(target_length).collect();
    while sequence.len() < target_length {
        sequence.push(alphabet[rng.next_index(alphabet.len())] as char);
    }
    sequence
}

/// Maps a unit draw onto `[85, 95)`, rounded down to one decimal place.
pub fn confidence_score(unit: f64) -> f64 {
    let raw = CONFIDENCE_FLOOR + CONFIDENCE_SPAN * unit.clamp(0.0, 1.0);
    let rounded = (raw * 10.0).floor() / 10.0;
    rounded.min(CONFIDENCE_FLOOR + CONFIDENCE_SPAN - 0.1)
}
