pub mod catalog;
pub mod designer;
pub mod domain;
pub mod entitlement;
pub mod ports;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use designer::{DesignerSession, SubmitError};
pub use domain::{
    ConfidenceTier, DesignForm, FoldingType, GenerationJob, GenerationPhase, GenerationRequest,
    JobStatus, Plan, PricingPlan, ProteinDesign, ProteinParameters, SolubilityRequirement,
    StabilityPreference, User, UserUpdate,
};
pub use entitlement::EntitlementTracker;
pub use ports::{
    Clock, FaultInjector, JobObserver, NoopObserver, PortError, PortResult, RandomSource,
};
pub use validation::{is_valid, validate, ValidationError};
pub use workflow::{GenerationError, GenerationWorkflow, PhaseTimings};
