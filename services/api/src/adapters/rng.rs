//! services/api/src/adapters/rng.rs
//!
//! Adapter for the `RandomSource` port using a seedable `StdRng`.

use protein_designer_core::ports::RandomSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// An adapter that implements the `RandomSource` port.
///
/// All sessions share one generator, so the lock is held only for a single draw.
pub struct StdRngSource {
    rng: Mutex<StdRng>,
}

impl StdRngSource {
    /// Seeds deterministically when `seed` is given, otherwise from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl RandomSource for StdRngSource {
    fn next_index(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..len)
    }

    fn next_unit(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random::<f64>()
    }
}
