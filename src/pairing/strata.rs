//! Strata: one cumulative probability array per (sex, risk group, age group)
//!
//! There are 2 sexes, 2 risk groups and at most 24 age groups, so 96 strata,
//! indexed as `sex * 48 + risk * 24 + age_group`.

use crate::cpa::{Cpa, CpaIterator};
use crate::population::{IndividualId, RiskGroup, Sex, AGE_GROUP_COUNT};

/// Number of strata.
pub const STRATUM_COUNT: usize = 2 * 2 * AGE_GROUP_COUNT;

/// Index of the stratum for `sex`, `risk` and `age_group`.
pub fn stratum_index(sex: Sex, risk: RiskGroup, age_group: usize) -> usize {
    debug_assert!(age_group < AGE_GROUP_COUNT);
    sex.index() * (STRATUM_COUNT / 2) + risk.index() * (STRATUM_COUNT / 4) + age_group
}

/// The arrays of one matching pass with their traversal state.
pub struct Strata {
    arrays: Vec<Cpa<IndividualId>>,
    iterators: Vec<CpaIterator>,
}

impl Strata {
    /// Create one array per stratum, sized by `tally`. Strata with a zero
    /// tally get an empty array reporting zero capacity.
    pub fn with_sizes(tally: &[usize; STRATUM_COUNT]) -> Self {
        Strata {
            arrays: tally.iter().map(|&n| Cpa::new(n)).collect(),
            iterators: vec![CpaIterator::new(); STRATUM_COUNT],
        }
    }

    pub fn array(&self, stratum: usize) -> &Cpa<IndividualId> {
        &self.arrays[stratum]
    }

    pub fn array_mut(&mut self, stratum: usize) -> &mut Cpa<IndividualId> {
        &mut self.arrays[stratum]
    }

    pub fn arrays(&self) -> &[Cpa<IndividualId>] {
        &self.arrays
    }

    /// Next individual of `stratum` in systematic order.
    pub fn iterate(&mut self, stratum: usize) -> Option<IndividualId> {
        self.arrays[stratum].iterate(&mut self.iterators[stratum])
    }

    /// Age groups of (`sex`, `risk`) whose array holds anyone, ascending.
    pub fn non_empty_age_groups(&self, sex: Sex, risk: RiskGroup) -> Vec<usize> {
        (0..AGE_GROUP_COUNT)
            .filter(|&age_group| !self.arrays[stratum_index(sex, risk, age_group)].is_empty())
            .collect()
    }

    /// Release every array, populated or not.
    pub fn destroy(self) {
        for array in self.arrays {
            array.destroy();
        }
    }
}

/// Age groups still holding undrawn individuals, per sex and risk group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AvailableAgeGroups {
    lists: [Vec<usize>; 4],
}

impl AvailableAgeGroups {
    pub fn from_strata(strata: &Strata) -> Self {
        let mut available = AvailableAgeGroups::default();
        for sex in Sex::ALL {
            for risk in RiskGroup::ALL {
                available.lists[Self::slot(sex, risk)] = strata.non_empty_age_groups(sex, risk);
            }
        }
        available
    }

    fn slot(sex: Sex, risk: RiskGroup) -> usize {
        sex.index() * 2 + risk.index()
    }

    pub fn get(&self, sex: Sex, risk: RiskGroup) -> &[usize] {
        &self.lists[Self::slot(sex, risk)]
    }

    pub fn has_any(&self, sex: Sex, risk: RiskGroup) -> bool {
        !self.lists[Self::slot(sex, risk)].is_empty()
    }

    /// Drop the age group at `position` once its array is exhausted.
    pub fn remove_at(&mut self, sex: Sex, risk: RiskGroup, position: usize) -> usize {
        self.lists[Self::slot(sex, risk)].remove(position)
    }
}
