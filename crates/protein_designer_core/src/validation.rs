//! crates/protein_designer_core/src/validation.rs
//!
//! The gate every designer submission passes before it may touch the quota or
//! start a job. Pure: no side effects.

use crate::domain::{DesignForm, GenerationRequest, ProteinParameters};

pub const MIN_TARGET_LENGTH: i64 = 20;
pub const MAX_TARGET_LENGTH: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Target length {0} must be between 20 and 500")]
    TargetLengthOutOfRange(i64),
    #[error("A folding type must be selected")]
    MissingFoldingType,
    #[error("A stability preference must be selected")]
    MissingStabilityPreference,
    #[error("A solubility requirement must be selected")]
    MissingSolubilityRequirement,
}

/// Checks `form` and returns the typed request, or the first violation found.
pub fn validate(form: &DesignForm) -> Result<GenerationRequest, ValidationError> {
    if form.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    let folding_type = form.folding_type.ok_or(ValidationError::MissingFoldingType)?;
    let stability_preference = form
        .stability_preference
        .ok_or(ValidationError::MissingStabilityPreference)?;
    let solubility_requirement = form
        .solubility_requirement
        .ok_or(ValidationError::MissingSolubilityRequirement)?;
    if !(MIN_TARGET_LENGTH..=MAX_TARGET_LENGTH).contains(&form.target_length) {
        return Err(ValidationError::TargetLengthOutOfRange(form.target_length));
    }

    Ok(GenerationRequest {
        description: form.description.clone(),
        parameters: ProteinParameters {
            // In range, so the narrowing cannot truncate.
            target_length: form.target_length as u32,
            folding_type,
            stability_preference,
            solubility_requirement,
        },
    })
}

pub fn is_valid(form: &DesignForm) -> bool {
    validate(form).is_ok()
}
