//! crates/protein_designer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the designer: users and their plans,
//! generation parameters, jobs and the designs they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Plans and Users
//=========================================================================================

/// The subscription tier of a user. `Pro` is the only unlimited tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Pro,
    Custom,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
            Plan::Custom => "custom",
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Plan::Pro)
    }
}

/// Represents the signed-in user of a designer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub generations_used: u32,
    /// Ignored when the plan is `Pro`.
    pub generations_limit: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        plan: Plan,
        generations_limit: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            plan,
            generations_used: 0,
            generations_limit,
            created_at: now,
        }
    }

    /// The demo account every fresh session starts with: a free user who has
    /// already spent one of three generations.
    pub fn mock(now: DateTime<Utc>) -> Self {
        Self {
            generations_used: 1,
            ..Self::new("user@example.com", Plan::Free, 3, now)
        }
    }
}

/// A partial update merged into a `User`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub plan: Option<Plan>,
    pub generations_used: Option<u32>,
    pub generations_limit: Option<u32>,
}

//=========================================================================================
// Generation Parameters
//=========================================================================================

/// Declares a kebab-case parameter enum together with its string conversions.
macro_rules! parameter_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownOption {
                        field: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Returned when a string does not name any option of a parameter enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {field}")]
pub struct UnknownOption {
    pub field: &'static str,
    pub value: String,
}

parameter_enum!(
    /// The dominant secondary structure requested for the design.
    FoldingType {
        AlphaHelix => "alpha-helix",
        BetaSheet => "beta-sheet",
        Mixed => "mixed",
        RandomCoil => "random-coil",
    }
);

parameter_enum!(
    StabilityPreference {
        HighThermal => "high-thermal",
        Flexible => "flexible",
        Neutral => "neutral",
    }
);

parameter_enum!(
    SolubilityRequirement {
        Soluble => "soluble",
        MembraneBound => "membrane-bound",
        NoPreference => "no-preference",
    }
);

/// Validated generation parameters. Only the validation gate builds these from
/// user input, so `target_length` is always within the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinParameters {
    pub target_length: u32,
    pub folding_type: FoldingType,
    pub stability_preference: StabilityPreference,
    pub solubility_requirement: SolubilityRequirement,
}

/// The raw designer form as submitted. Enumerations are `None` until the user
/// picks an option; an empty string counts as no selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DesignForm {
    #[serde(default)]
    pub description: String,
    pub target_length: i64,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub folding_type: Option<FoldingType>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub stability_preference: Option<StabilityPreference>,
    #[serde(default, deserialize_with = "deserialize_selection")]
    pub solubility_requirement: Option<SolubilityRequirement>,
}

impl Default for DesignForm {
    /// Mirrors the initial state of the designer form.
    fn default() -> Self {
        Self {
            description: String::new(),
            target_length: 100,
            folding_type: None,
            stability_preference: None,
            solubility_requirement: None,
        }
    }
}

fn deserialize_selection<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// A submission that passed the validation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub description: String,
    pub parameters: ProteinParameters,
}

//=========================================================================================
// Jobs and Designs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// The two simulated stages of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    /// Models "model initialization".
    Initialization,
    /// Models "structure prediction".
    Prediction,
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationPhase::Initialization => f.write_str("initialization"),
            GenerationPhase::Prediction => f.write_str("prediction"),
        }
    }
}

/// A tracked unit of work. Mutated in place as it advances through its states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub description: String,
    pub result: Option<ProteinDesign>,
    /// Set only when `status` is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn pending(description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            description: description.into(),
            result: None,
            error: None,
            created_at: now,
        }
    }
}

/// The fabricated output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinDesign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub target_length: u32,
    pub folding_type: FoldingType,
    pub stability_preference: StabilityPreference,
    pub solubility_requirement: SolubilityRequirement,
    pub sequence: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub exported: bool,
}

impl ProteinDesign {
    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::of(self.confidence)
    }
}

/// Coarse grading of a confidence score, used to colour results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 90.0 {
            ConfidenceTier::High
        } else if confidence >= 80.0 {
            ConfidenceTier::Moderate
        } else {
            ConfidenceTier::Low
        }
    }
}

//=========================================================================================
// Pricing
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "count")]
pub enum GenerationAllowance {
    Limited(u32),
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingSpeed {
    Low,
    Medium,
    High,
}

/// A purchasable tier as advertised on the pricing section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingPlan {
    pub id: Plan,
    pub name: String,
    /// Price in whole US dollars.
    pub price: u32,
    pub period: String,
    pub features: Vec<String>,
    pub generations: GenerationAllowance,
    pub speed: ProcessingSpeed,
    pub watermark: bool,
    pub exports: bool,
}
