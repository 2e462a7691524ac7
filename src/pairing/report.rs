//! Statistics of a matching pass

use serde::{Deserialize, Serialize};

/// Result of one matching pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingReport {
    /// Individuals that passed the eligibility check
    pub eligible: usize,
    /// Strata holding at least one individual
    pub strata_used: usize,
    /// Iterations of the match loop
    pub iterations: usize,
    /// Partnerships created
    pub partnerships_formed: usize,
    /// Former partners left single by new partnerships
    pub displaced: usize,
    /// Source individuals drawn while the opposite sex had nobody left
    pub unmatched_sources: usize,
}

impl PairingReport {
    /// Merge the counts of several passes.
    pub fn total<'a>(reports: impl IntoIterator<Item = &'a PairingReport>) -> PairingReport {
        reports
            .into_iter()
            .fold(PairingReport::default(), |mut acc, r| {
                acc.eligible += r.eligible;
                acc.strata_used += r.strata_used;
                acc.iterations += r.iterations;
                acc.partnerships_formed += r.partnerships_formed;
                acc.displaced += r.displaced;
                acc.unmatched_sources += r.unmatched_sources;
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_counts() {
        let a = PairingReport {
            iterations: 3,
            partnerships_formed: 3,
            ..PairingReport::default()
        };
        let b = PairingReport {
            iterations: 2,
            partnerships_formed: 1,
            unmatched_sources: 1,
            displaced: 2,
            ..PairingReport::default()
        };
        let total = PairingReport::total([&a, &b]);
        assert_eq!(total.iterations, 5);
        assert_eq!(total.partnerships_formed, 4);
        assert_eq!(total.displaced, 2);
        assert_eq!(total.unmatched_sources, 1);
    }
}
