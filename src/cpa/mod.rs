//! Cumulative probability arrays
//!
//! A weighted multiset supporting sampling without replacement. Entries are
//! appended once and never moved; each keeps the prefix sum it had at append
//! time. Removals never rewrite prefix sums. Instead they leave compensation
//! in per-entry adjustments:
//!
//! - `left_adjust` / `right_adjust` are read by the O(log n) descent over the
//!   implicit balanced tree whose nodes are range midpoints. A removal only
//!   touches the nodes on its own root-to-node path.
//! - `scan_adjust` is read by the O(n) linear scan.
//!
//! Every removal, whatever operation caused it, maintains both, so draws of
//! different kinds can be mixed on one array.

mod traversal;
mod weights;

pub use traversal::CpaIterator;
pub use weights::{TestWeights, WeightFn};

use tracing::trace;

use crate::error::CpaError;
use crate::rng::RandomSource;

/// One weighted payload and its removal bookkeeping.
#[derive(Clone, Debug)]
pub struct Entry<T> {
    payload: T,
    weight: f64,
    prefix_weight: f64,
    removed: bool,
    left_adjust: f64,
    right_adjust: f64,
    scan_adjust: f64,
}

impl<T> Entry<T> {
    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sum of the weights up to and including this entry, at append time.
    pub fn prefix_weight(&self) -> f64 {
        self.prefix_weight
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Cumulative probability array over payloads of type `T`.
#[derive(Clone, Debug)]
pub struct Cpa<T> {
    entries: Vec<Entry<T>>,
    capacity: usize,
    drawn: usize,
    remaining_weight: f64,
    construction_error: Option<CpaError>,
}

/// Midpoint of the index range `[low, end)`, rounding towards the upper half.
#[inline]
pub(crate) fn midpoint(low: usize, end: usize) -> usize {
    (low + end) / 2
}

impl<T: Clone> Cpa<T> {
    /// Create an empty array able to hold `capacity` entries.
    ///
    /// Failure is reported through [`Cpa::construction_error`]; a failed array
    /// has no capacity and must not be appended to.
    pub fn new(capacity: usize) -> Self {
        let mut cpa = Cpa {
            entries: Vec::new(),
            capacity: 0,
            drawn: 0,
            remaining_weight: 0.0,
            construction_error: None,
        };
        if capacity == 0 {
            cpa.construction_error = Some(CpaError::ZeroCapacity);
            return cpa;
        }
        if cpa.entries.try_reserve_exact(capacity).is_err() {
            trace!(capacity, "cpa allocation failed");
            cpa.construction_error = Some(CpaError::OutOfMemory { requested: capacity });
            return cpa;
        }
        cpa.capacity = capacity;
        cpa
    }

    /// Like [`Cpa::new`] but returns the construction status as an error.
    pub fn try_new(capacity: usize) -> Result<Self, CpaError> {
        let cpa = Self::new(capacity);
        match cpa.construction_error {
            Some(err) => Err(err),
            None => Ok(cpa),
        }
    }

    /// Create an array of `capacity` entries and append up to `capacity`
    /// payloads, weighting each with `weight_fn`.
    pub fn from_payloads<I, W>(capacity: usize, payloads: I, weight_fn: &mut W) -> Self
    where
        I: IntoIterator<Item = T>,
        W: WeightFn<T> + ?Sized,
    {
        let mut cpa = Self::new(capacity);
        if cpa.construction_error.is_some() {
            return cpa;
        }
        for payload in payloads.into_iter().take(capacity) {
            let weight = weight_fn.weight(&payload);
            cpa.append(payload, weight);
        }
        cpa
    }

    /// Like [`Cpa::from_payloads`], weighting each payload with the uniform
    /// 1..=10 [`TestWeights`] generator over `rng`.
    pub fn from_payloads_with_test_weights<I, R>(
        capacity: usize,
        payloads: I,
        rng: &mut R,
    ) -> Self
    where
        I: IntoIterator<Item = T>,
        R: RandomSource + ?Sized,
    {
        Self::from_payloads(capacity, payloads, &mut TestWeights::new(rng))
    }

    /// Construction status: `None` when the array is usable.
    pub fn construction_error(&self) -> Option<CpaError> {
        self.construction_error
    }

    /// Append a payload at the end of the array.
    ///
    /// The weight must be positive and finite. Appending past the capacity
    /// given at construction is a caller error.
    pub fn append(&mut self, payload: T, weight: f64) {
        assert!(
            weight > 0.0 && weight.is_finite(),
            "cpa weights must be positive and finite, got {weight}"
        );
        debug_assert!(
            self.entries.len() < self.capacity,
            "append past cpa capacity {}",
            self.capacity
        );
        let prefix_weight = self.entries.last().map_or(0.0, |e| e.prefix_weight) + weight;
        self.entries.push(Entry {
            payload,
            weight,
            prefix_weight,
            removed: false,
            left_adjust: 0.0,
            right_adjust: 0.0,
            scan_adjust: 0.0,
        });
        self.remaining_weight += weight;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    /// Weight of the entries not yet drawn.
    pub fn remaining_weight(&self) -> f64 {
        self.remaining_weight
    }

    pub fn remaining_count(&self) -> usize {
        self.entries.len() - self.drawn
    }

    /// True once every entry has been drawn.
    pub fn all_drawn(&self) -> bool {
        self.drawn == self.entries.len()
    }

    /// O(n) weighted draw.
    ///
    /// Returns the payload whose adjusted bracket `[start, end)` contains
    /// `key`. Keys must lie in `[0, remaining_weight)`; others give `None`.
    /// With fractional weights the adjusted brackets can drift apart by
    /// rounding error, and a key in range that falls between them takes the
    /// nearest live entry.
    pub fn linear_draw(&mut self, key: f64) -> Option<T> {
        let mut running = 0.0;
        let mut found = None;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.removed {
                running += entry.scan_adjust;
                continue;
            }
            let end = entry.prefix_weight + running;
            if end - entry.weight <= key && key < end {
                found = Some(i);
                break;
            }
        }
        let index = found.or_else(|| self.nearest_live(key))?;
        let path = self.descent_path(index);
        self.remove_at(index, &path);
        Some(self.entries[index].payload.clone())
    }

    /// O(log n) weighted draw with the same bracket semantics as
    /// [`Cpa::linear_draw`].
    pub fn binary_draw(&mut self, key: f64) -> Option<T> {
        let mut low = 0;
        let mut end = self.entries.len();
        let mut path = Vec::with_capacity(tree_depth(self.entries.len()));
        let mut carried = 0.0;

        while low < end {
            let mid = midpoint(low, end);
            path.push(mid);
            let entry = &self.entries[mid];
            if entry.prefix_weight + carried + entry.right_adjust <= key {
                carried += entry.right_adjust;
                low = mid + 1;
                continue;
            }
            carried += entry.left_adjust;
            if entry.removed || entry.prefix_weight - entry.weight + carried > key {
                end = mid;
                continue;
            }
            self.remove_at(mid, &path);
            return Some(self.entries[mid].payload.clone());
        }

        let index = self.nearest_live(key)?;
        let path = self.descent_path(index);
        self.remove_at(index, &path);
        Some(self.entries[index].payload.clone())
    }

    /// Live entry for a key in `[0, remaining_weight)` that no adjusted
    /// bracket contains: the first whose bracket ends past the key, or the
    /// last live entry.
    fn nearest_live(&self, key: f64) -> Option<usize> {
        if !(0.0..self.remaining_weight).contains(&key) {
            return None;
        }
        let mut running = 0.0;
        let mut last = None;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.removed {
                running += entry.scan_adjust;
                continue;
            }
            if key < entry.prefix_weight + running {
                return Some(i);
            }
            last = Some(i);
        }
        if last.is_some() {
            trace!(key, remaining = self.remaining_weight, "cpa key resolved past rounding gap");
        }
        last
    }

    /// Clear every removal flag so a new sampling pass can run.
    ///
    /// The remaining weight and all adjustments are left untouched. Before
    /// drawing by key again call [`Cpa::recompute_remaining_weight`]; only
    /// [`Cpa::linear_draw`] and the traversals are sound after a reset,
    /// [`Cpa::binary_draw`] still sees the old compensation.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.removed = false;
        }
        self.drawn = 0;
    }

    /// Set the remaining weight back to the total appended weight.
    pub fn recompute_remaining_weight(&mut self) {
        self.remaining_weight = self.entries.last().map_or(0.0, |e| e.prefix_weight);
    }

    /// Release the array. Payloads are dropped with it.
    pub fn destroy(self) {
        trace!(len = self.entries.len(), drawn = self.drawn, "cpa destroyed");
    }

    /// Root-to-node path of `index` in the implicit tree.
    fn descent_path(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::with_capacity(tree_depth(self.entries.len()));
        let mut low = 0;
        let mut end = self.entries.len();
        while low < end {
            let mid = midpoint(low, end);
            path.push(mid);
            if mid == index {
                break;
            }
            if mid < index {
                low = mid + 1;
            } else {
                end = mid;
            }
        }
        path
    }

    /// Mark `index` drawn and leave compensation on the nodes of `path`,
    /// its root-to-node path.
    ///
    /// Walking down the path, nodes above the drawn entry are seen while the
    /// search still heads left of them; those carry `-weight` into their left
    /// subtree. The next node below the entry cancels it again. The
    /// subtraction and cancellation alternate down the path, so every prefix
    /// read along any later descent is reduced exactly when it covers the
    /// drawn entry.
    pub(crate) fn remove_at(&mut self, index: usize, path: &[usize]) {
        let weight = self.entries[index].weight;
        let mut carrying = false;
        for &node in path {
            let entry = &mut self.entries[node];
            if !carrying && node > index {
                carrying = true;
                entry.left_adjust -= weight;
                entry.right_adjust -= weight;
            } else if carrying && node < index {
                carrying = false;
                entry.left_adjust += weight;
                entry.right_adjust += weight;
            } else if node == index {
                if carrying {
                    entry.left_adjust += weight;
                } else {
                    entry.right_adjust -= weight;
                }
            }
        }

        let entry = &mut self.entries[index];
        entry.removed = true;
        entry.scan_adjust = -weight;
        self.drawn += 1;
        self.remaining_weight -= weight;
    }
}

/// Depth of the implicit tree over `n` entries.
fn tree_depth(n: usize) -> usize {
    (usize::BITS - n.leading_zeros()) as usize
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn build(weights: &[u32]) -> Cpa<usize> {
        let mut cpa = Cpa::new(weights.len());
        for (i, &w) in weights.iter().enumerate() {
            cpa.append(i, f64::from(w));
        }
        cpa
    }

    /// Turns a fraction in `[0, 1)` into an integer key below `remaining`.
    fn key_for(remaining: f64, fraction: f64) -> f64 {
        (remaining * fraction).floor().min(remaining - 1.0)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn remaining_weight_is_sum_of_appends(
            weights in proptest::collection::vec(1_u32..50, 1..64),
        ) {
            let cpa = build(&weights);
            let total: u32 = weights.iter().sum();
            prop_assert_eq!(cpa.remaining_weight(), f64::from(total));
        }

        #[test]
        fn binary_and_linear_draws_agree(
            weights in proptest::collection::vec(1_u32..10, 1..48),
            fractions in proptest::collection::vec(0.0_f64..1.0, 48),
        ) {
            let mut binary = build(&weights);
            let mut linear = build(&weights);
            for fraction in fractions.iter().take(weights.len()) {
                let key = key_for(binary.remaining_weight(), *fraction);
                let a = binary.binary_draw(key);
                let b = linear.linear_draw(key);
                prop_assert!(a.is_some());
                prop_assert_eq!(a, b);
                prop_assert_eq!(binary.remaining_weight(), linear.remaining_weight());
            }
            prop_assert!(binary.all_drawn());
            prop_assert!(linear.all_drawn());
        }

        #[test]
        fn any_mix_of_draws_returns_each_entry_once(
            weights in proptest::collection::vec(1_u32..10, 1..48),
            picks in proptest::collection::vec((0_u8..3, 0.0_f64..1.0), 48),
        ) {
            let mut cpa = build(&weights);
            let mut iterator = CpaIterator::new();
            let mut seen = Vec::new();
            for (i, (kind, fraction)) in picks.iter().take(weights.len()).enumerate() {
                prop_assert!(!cpa.all_drawn());
                let key = key_for(cpa.remaining_weight(), *fraction);
                let drawn = match kind {
                    0 => cpa.binary_draw(key),
                    1 => cpa.linear_draw(key),
                    _ => cpa.iterate(&mut iterator),
                };
                prop_assert!(drawn.is_some(), "draw {} of kind {} failed", i, kind);
                seen.extend(drawn);
            }
            prop_assert!(cpa.all_drawn());
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..weights.len()).collect::<Vec<_>>());
        }

        #[test]
        fn fractional_weights_always_draw_in_range_keys(
            weights in proptest::collection::vec(0.01_f64..3.0, 1..48),
            picks in proptest::collection::vec((any::<bool>(), 0.0_f64..1.0), 48),
        ) {
            let mut cpa = Cpa::new(weights.len());
            for (i, &w) in weights.iter().enumerate() {
                cpa.append(i, w);
            }
            let mut seen = Vec::new();
            for (binary, fraction) in picks.iter().take(weights.len()) {
                let remaining = cpa.remaining_weight();
                let key = (remaining * fraction).min(remaining * (1.0 - f64::EPSILON));
                let drawn = if *binary { cpa.binary_draw(key) } else { cpa.linear_draw(key) };
                prop_assert!(drawn.is_some(), "key {} of {} missed", key, cpa.remaining_weight());
                seen.extend(drawn);
            }
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..weights.len()).collect::<Vec<_>>());
        }
    }
}
