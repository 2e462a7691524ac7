//! Pluggable matching policies
//!
//! Each decision the matcher delegates has its own trait with a default
//! implementation. Closures with the matching signature implement the traits
//! too, which keeps one-off policies short.

use crate::params::PairingParams;
use crate::population::Individual;
use crate::rng::RandomSource;

/// Decides whether an individual takes part in a matching pass.
pub trait Eligibility {
    fn can_pair(&mut self, individual: &Individual) -> bool;
}

/// Picks the age group to draw a partner from.
pub trait AgeGroupSelector {
    /// Returns a position in `available`, which is sorted ascending and
    /// never empty.
    fn select_age_group(
        &mut self,
        available: &[usize],
        individual: &Individual,
        rng: &mut dyn RandomSource,
    ) -> usize;
}

/// Sampling weight of an individual within its stratum.
pub trait WeightGenerator {
    fn generate_weight(&mut self, individual: &Individual) -> f64;
}

impl<F: FnMut(&Individual) -> bool> Eligibility for F {
    fn can_pair(&mut self, individual: &Individual) -> bool {
        self(individual)
    }
}

impl<F> AgeGroupSelector for F
where
    F: FnMut(&[usize], &Individual, &mut dyn RandomSource) -> usize,
{
    fn select_age_group(
        &mut self,
        available: &[usize],
        individual: &Individual,
        rng: &mut dyn RandomSource,
    ) -> usize {
        self(available, individual, rng)
    }
}

impl<F: FnMut(&Individual) -> f64> WeightGenerator for F {
    fn generate_weight(&mut self, individual: &Individual) -> f64 {
        self(individual)
    }
}

/// Everyone is eligible.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyoneCanPair;

impl Eligibility for AnyoneCanPair {
    fn can_pair(&mut self, _individual: &Individual) -> bool {
        true
    }
}

/// Prefer the individual's own age group, otherwise one of its neighbours.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClosestAgeGroup;

impl AgeGroupSelector for ClosestAgeGroup {
    fn select_age_group(
        &mut self,
        available: &[usize],
        individual: &Individual,
        rng: &mut dyn RandomSource,
    ) -> usize {
        search_age_groups(available, individual.age_group, rng)
    }
}

/// Binary search for `key` in the sorted `available` age groups.
///
/// An exact hit returns its position. Otherwise the search stops with its
/// bounds crossed or touching, and one of the two boundary positions is
/// chosen at random; a bound past the end falls back to the last position.
pub fn search_age_groups(available: &[usize], key: usize, rng: &mut dyn RandomSource) -> usize {
    debug_assert!(!available.is_empty());
    let mut low = 0;
    let mut high = available.len().saturating_sub(1);
    loop {
        if high <= low {
            return if low < available.len() {
                rng.uniform_int_inclusive(high as i64, low as i64) as usize
            } else {
                high
            };
        }
        let mid = (low + high + 1) / 2;
        if available[mid] == key {
            return mid;
        }
        if available[mid] > key {
            high = mid - 1;
        } else {
            low = mid + 1;
        }
    }
}

/// Weights by age band: 15-39 weigh 3, 40-49 weigh 2, everyone else 1,
/// unless configured otherwise.
#[derive(Clone, Debug)]
pub struct AgeBandWeights {
    params: PairingParams,
}

impl AgeBandWeights {
    pub fn new(params: PairingParams) -> Self {
        AgeBandWeights { params }
    }
}

impl Default for AgeBandWeights {
    fn default() -> Self {
        Self::new(PairingParams::default())
    }
}

impl WeightGenerator for AgeBandWeights {
    fn generate_weight(&mut self, individual: &Individual) -> f64 {
        self.params.weight_for_age(individual.age)
    }
}
