//! crates/protein_designer_core/src/catalog.rs
//!
//! Static product data: the pricing tiers and the example descriptions offered
//! by the designer form.

use crate::domain::{GenerationAllowance, Plan, PricingPlan, ProcessingSpeed};

const SUGGESTIONS: &[&str] = &[
    "Enzyme to degrade plastic",
    "Binder to viral protein",
    "Stable scaffold under 100 aa",
    "Thermostable enzyme for industrial use",
    "Membrane protein for drug transport",
    "Antimicrobial peptide",
    "Protein-protein interaction inhibitor",
    "Fluorescent protein marker",
];

/// Example descriptions a user can pick instead of typing their own.
pub fn suggestions() -> &'static [&'static str] {
    SUGGESTIONS
}

/// The advertised tiers. `Custom` is negotiated with sales and is not listed.
pub fn pricing_plans() -> Vec<PricingPlan> {
    vec![
        PricingPlan {
            id: Plan::Free,
            name: "Free Plan".to_string(),
            price: 0,
            period: "forever".to_string(),
            features: features(&[
                "3 total generations",
                "Low processing speed",
                "Watermarked low-res preview",
                "No export options",
                "Basic support",
            ]),
            generations: GenerationAllowance::Limited(3),
            speed: ProcessingSpeed::Low,
            watermark: true,
            exports: false,
        },
        PricingPlan {
            id: Plan::Basic,
            name: "Basic Plan".to_string(),
            price: 19,
            period: "month".to_string(),
            features: features(&[
                "10 generations per month",
                "Medium processing speed",
                "Full-resolution preview",
                "Export permissions",
                "Email support",
                "Structure validation",
            ]),
            generations: GenerationAllowance::Limited(10),
            speed: ProcessingSpeed::Medium,
            watermark: false,
            exports: true,
        },
        PricingPlan {
            id: Plan::Pro,
            name: "Pro Plan".to_string(),
            price: 49,
            period: "month".to_string(),
            features: features(&[
                "Unlimited generations",
                "Fastest processing speed",
                "Full export (FASTA, PDB, JSON)",
                "No watermarks",
                "Priority queue",
                "Advanced analytics",
                "Priority support",
            ]),
            generations: GenerationAllowance::Unlimited,
            speed: ProcessingSpeed::High,
            watermark: false,
            exports: true,
        },
    ]
}

pub fn plan_for(plan: Plan) -> Option<PricingPlan> {
    pricing_plans().into_iter().find(|p| p.id == plan)
}

/// The generation quota a new user on `plan` starts with.
///
/// Returns `None` for `Pro` (unlimited) and `Custom` (negotiated per customer).
pub fn default_limit(plan: Plan) -> Option<u32> {
    match plan_for(plan)?.generations {
        GenerationAllowance::Limited(n) => Some(n),
        GenerationAllowance::Unlimited => None,
    }
}

fn features(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
