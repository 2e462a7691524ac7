//! Random number service for pairing
//!
//! Everything random in a matching pass (shuffling, choosing a source sex,
//! age-group tie-breaks, weighted keys) goes through [`RandomSource`], so a
//! single seeded generator reproduces a whole pass.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform integer generator used by the sampler and the orchestrator.
pub trait RandomSource {
    /// Uniform integer in the half-open range `[low, high)`.
    ///
    /// `high` must be greater than `low`.
    fn uniform_int(&mut self, low: i64, high: i64) -> i64;

    /// Uniform integer in the closed range `[low, high]`.
    fn uniform_int_inclusive(&mut self, low: i64, high: i64) -> i64 {
        self.uniform_int(low, high + 1)
    }

    /// Uniform index into a collection of `len` elements.
    fn uniform_index(&mut self, len: usize) -> usize {
        self.uniform_int(0, len as i64) as usize
    }
}

impl<R: Rng> RandomSource for R {
    fn uniform_int(&mut self, low: i64, high: i64) -> i64 {
        self.gen_range(low..high)
    }
}

/// Create the standard seeded generator.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive a sub-seed from a master seed and a label.
/// Different labels give different but deterministic seeds.
pub fn derive_seed(master: u64, label: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    label.hash(&mut hasher);
    hasher.finish()
}

/// Seed for the `pass`-th matching pass driven from `master`.
pub fn pass_seed(master: u64, pass: u32) -> u64 {
    derive_seed(master, &format!("pass-{pass}"))
}

/// Fisher-Yates shuffle driven by a [`RandomSource`].
///
/// Goes through `uniform_int` rather than `rand::seq::SliceRandom::shuffle`
/// so a `RandomSource` that is not a `rand::Rng` still drives every draw of
/// a pass.
pub fn shuffle<T, R: RandomSource + ?Sized>(slice: &mut [T], rng: &mut R) {
    for i in (1..slice.len()).rev() {
        let j = rng.uniform_int_inclusive(0, i as i64) as usize;
        slice.swap(i, j);
    }
}

/// Random permutation of `[0, n)`.
pub fn shuffled_indices<R: RandomSource + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    shuffle(&mut indices, rng);
    indices
}

/// Key for a weighted draw from a structure holding `remaining_weight`.
///
/// Integer-valued and always inside `[0, remaining_weight)` when the remaining
/// weight is at least one; otherwise the key is zero.
pub fn weighted_key<R: RandomSource + ?Sized>(remaining_weight: f64, rng: &mut R) -> f64 {
    let upper = (remaining_weight.floor() as i64).max(1);
    rng.uniform_int(0, upper) as f64
}
