//! Population arena and partnerships
//!
//! The population owns every [`Individual`]. Pairing code only ever holds
//! [`IndividualId`]s, so the arena can grow without invalidating anything.

pub mod types;

pub use types::{
    age_group_for, Individual, IndividualId, RiskGroup, Sex, AGE_GROUP_COUNT, AGE_GROUP_WIDTH,
};

use serde::{Deserialize, Serialize};

/// Outcome of linking two individuals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Former partners left single by the new partnership.
    pub displaced: Vec<IndividualId>,
}

/// Owning container for all individuals.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Self {
        Population {
            individuals: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Population {
            individuals: Vec::with_capacity(capacity),
        }
    }

    /// Add an unpartnered individual and return its id.
    pub fn add(&mut self, sex: Sex, age: u32, risk_group: RiskGroup) -> IndividualId {
        let id = IndividualId(self.individuals.len());
        self.individuals.push(Individual::new(id, sex, age, risk_group));
        id
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.get(id.0)
    }

    pub fn get_mut(&mut self, id: IndividualId) -> Option<&mut Individual> {
        self.individuals.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.individuals.iter_mut()
    }

    /// Partner of `id`, if any.
    pub fn partner_of(&self, id: IndividualId) -> Option<IndividualId> {
        self.get(id).and_then(|ind| ind.partner)
    }

    /// Make `a` and `b` partners of each other.
    ///
    /// Any existing partnership on either side is broken first and the former
    /// partner is left single. Returns `None` without changing anything when
    /// either id is not in this population or both ids are the same.
    pub fn link(&mut self, a: IndividualId, b: IndividualId) -> Option<LinkOutcome> {
        if a == b || self.get(a).is_none() || self.get(b).is_none() {
            return None;
        }
        let mut outcome = LinkOutcome::default();

        for (who, new_partner) in [(a, b), (b, a)] {
            let individual = self.get_mut(who)?;
            let previous = individual.partner.replace(new_partner);
            if let Some(old) = previous.filter(|&old| old != new_partner) {
                if let Some(former) = self.get_mut(old) {
                    former.partner = None;
                }
                if old != a && old != b {
                    outcome.displaced.push(old);
                }
            }
        }
        Some(outcome)
    }

    /// Break the partnership of `id`, returning the former partner.
    pub fn unlink(&mut self, id: IndividualId) -> Option<IndividualId> {
        let old = self.get_mut(id)?.partner.take()?;
        if let Some(former) = self.get_mut(old).filter(|former| former.partner == Some(id)) {
            former.partner = None;
        }
        Some(old)
    }

    /// Counts of partnered individuals and a consistency check of the
    /// partner references.
    pub fn partnership_summary(&self) -> PartnershipSummary {
        let mut summary = PartnershipSummary {
            total: self.individuals.len(),
            ..PartnershipSummary::default()
        };
        for ind in &self.individuals {
            if ind.eligible {
                summary.eligible += 1;
            }
            match ind.partner {
                Some(p) => {
                    summary.partnered += 1;
                    let mutual = self
                        .get(p)
                        .is_some_and(|other| other.partner == Some(ind.id) && other.sex != ind.sex);
                    if !mutual {
                        summary.inconsistent += 1;
                    }
                }
                None => summary.single += 1,
            }
        }
        summary
    }
}

impl FromIterator<Individual> for Population {
    /// Collect individuals, renumbering their ids by position.
    fn from_iter<I: IntoIterator<Item = Individual>>(iter: I) -> Self {
        let individuals = iter
            .into_iter()
            .enumerate()
            .map(|(i, mut ind)| {
                ind.id = IndividualId(i);
                ind
            })
            .collect();
        Population { individuals }
    }
}

/// Snapshot of partnership state across a population.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipSummary {
    pub total: usize,
    pub eligible: usize,
    pub partnered: usize,
    pub single: usize,
    /// Partner references that are not mutual or not opposite-sex.
    pub inconsistent: usize,
}

impl PartnershipSummary {
    pub fn is_consistent(&self) -> bool {
        self.inconsistent == 0
    }

    /// Number of couples.
    pub fn couples(&self) -> usize {
        self.partnered / 2
    }
}
