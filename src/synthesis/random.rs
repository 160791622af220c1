//! Injectable randomness for grain and bokeh

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform random integers consumed by the effect primitives
///
/// Any [`rand::Rng`] is a `RandomSource`, so tests can pass a seeded
/// `StdRng` and get reproducible backdrops.
pub trait RandomSource {
    /// Uniform integer in `low..=high`; `low` must not exceed `high`
    fn int_inclusive(&mut self, low: i32, high: i32) -> i32;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn int_inclusive(&mut self, low: i32, high: i32) -> i32 {
        self.gen_range(low..=high)
    }
}

/// Reproducible generator for the given seed
#[must_use]
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generator seeded from operating system entropy
#[must_use]
pub fn from_entropy() -> StdRng {
    StdRng::from_entropy()
}
