//! Heterosexual partnership matching
//!
//! A matching pass sorts eligible individuals into strata by sex, risk group
//! and age group, one cumulative probability array per stratum, then keeps
//! pairing until the high-risk strata of both sexes are exhausted:
//!
//! - the source is drawn systematically from a random high-risk stratum;
//! - the target is drawn by weight from the opposite sex, high-risk while any
//!   remain and low-risk after that, in the age group the selector picks.
//!
//! Individuals were appended in shuffled order, so the systematic source draw
//! is still unbiased. The weighted target draw carries the mixing preference.

pub mod policy;
pub mod report;
pub mod strata;

pub use policy::{
    search_age_groups, AgeBandWeights, AgeGroupSelector, AnyoneCanPair, ClosestAgeGroup,
    Eligibility, WeightGenerator,
};
pub use report::PairingReport;
pub use strata::{stratum_index, AvailableAgeGroups, Strata, STRATUM_COUNT};

use tracing::{debug, info, warn};

use crate::error::{PairingError, Result};
use crate::params::PairingParams;
use crate::population::{
    age_group_for, IndividualId, Population, RiskGroup, Sex, AGE_GROUP_COUNT,
};
use crate::rng::{pass_seed, seeded_rng, shuffled_indices, weighted_key, RandomSource};

/// Runs matching passes with a fixed set of policies.
pub struct PairingOrchestrator<E = AnyoneCanPair, S = ClosestAgeGroup, W = AgeBandWeights> {
    eligibility: E,
    selector: S,
    weights: W,
    /// Width and count of the age groups to recompute before each pass;
    /// `None` keeps the age groups stored on the individuals.
    age_groups: Option<(u32, usize)>,
}

impl PairingOrchestrator {
    /// Orchestrator with the default policies.
    pub fn new() -> Self {
        PairingOrchestrator {
            eligibility: AnyoneCanPair,
            selector: ClosestAgeGroup,
            weights: AgeBandWeights::default(),
            age_groups: None,
        }
    }

    /// Default policies with weights and age groups taken from `params`.
    pub fn from_params(params: &PairingParams) -> Self {
        PairingOrchestrator {
            eligibility: AnyoneCanPair,
            selector: ClosestAgeGroup,
            weights: AgeBandWeights::new(params.clone()),
            age_groups: Some((params.age_group_width, params.age_group_count)),
        }
    }
}

impl Default for PairingOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, S, W> PairingOrchestrator<E, S, W>
where
    E: Eligibility,
    S: AgeGroupSelector,
    W: WeightGenerator,
{
    pub fn with_eligibility<E2: Eligibility>(self, eligibility: E2) -> PairingOrchestrator<E2, S, W> {
        PairingOrchestrator {
            eligibility,
            selector: self.selector,
            weights: self.weights,
            age_groups: self.age_groups,
        }
    }

    pub fn with_selector<S2: AgeGroupSelector>(self, selector: S2) -> PairingOrchestrator<E, S2, W> {
        PairingOrchestrator {
            eligibility: self.eligibility,
            selector,
            weights: self.weights,
            age_groups: self.age_groups,
        }
    }

    pub fn with_weights<W2: WeightGenerator>(self, weights: W2) -> PairingOrchestrator<E, S, W2> {
        PairingOrchestrator {
            eligibility: self.eligibility,
            selector: self.selector,
            weights,
            age_groups: self.age_groups,
        }
    }

    /// Recompute every individual's age group from its age before each pass,
    /// using groups `width` years wide and at most `count` of them.
    pub fn with_age_groups(mut self, width: u32, count: usize) -> Self {
        self.age_groups = Some((width, count));
        self
    }

    /// Run one matching pass over `population`.
    ///
    /// Existing partnerships are kept unless one of the partners is matched
    /// again, in which case the old partner is left single.
    pub fn match_pair<R: RandomSource>(
        &mut self,
        population: &mut Population,
        rng: &mut R,
    ) -> Result<PairingReport> {
        let mut report = PairingReport::default();

        let mut tally = [0usize; STRATUM_COUNT];
        for ind in population.iter_mut() {
            if let Some((width, count)) = self.age_groups {
                ind.age_group = age_group_for(ind.age, width, count);
            }
            ind.eligible = self.eligibility.can_pair(ind);
            if !ind.eligible {
                continue;
            }
            if ind.age_group >= AGE_GROUP_COUNT {
                return Err(PairingError::AgeGroupOutOfRange {
                    id: ind.id,
                    age_group: ind.age_group,
                    limit: AGE_GROUP_COUNT,
                });
            }
            tally[stratum_index(ind.sex, ind.risk_group, ind.age_group)] += 1;
            report.eligible += 1;
        }

        let order = shuffled_indices(population.len(), rng);
        let mut strata = Strata::with_sizes(&tally);
        for (stratum, &size) in tally.iter().enumerate() {
            if size > 0 {
                if let Some(err) = strata.array(stratum).construction_error() {
                    return Err(err.into());
                }
                report.strata_used += 1;
            }
        }

        for ind in order.into_iter().filter_map(|i| population.get(IndividualId(i))) {
            if !ind.eligible {
                continue;
            }
            let weight = self.weights.generate_weight(ind);
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(PairingError::InvalidWeight { id: ind.id, weight });
            }
            strata
                .array_mut(stratum_index(ind.sex, ind.risk_group, ind.age_group))
                .append(ind.id, weight);
        }

        let mut available = AvailableAgeGroups::from_strata(&strata);
        while available.has_any(Sex::Male, RiskGroup::High)
            || available.has_any(Sex::Female, RiskGroup::High)
        {
            report.iterations += 1;
            self.match_next(population, &mut strata, &mut available, rng, &mut report)?;
        }
        strata.destroy();

        info!(
            eligible = report.eligible,
            iterations = report.iterations,
            partnerships = report.partnerships_formed,
            displaced = report.displaced,
            unmatched = report.unmatched_sources,
            "matching pass complete"
        );
        Ok(report)
    }

    /// Run `passes` matching passes, each seeded from `master_seed`.
    pub fn run_passes(
        &mut self,
        population: &mut Population,
        passes: u32,
        master_seed: u64,
    ) -> Result<Vec<PairingReport>> {
        (0..passes)
            .map(|pass| {
                let mut rng = seeded_rng(pass_seed(master_seed, pass));
                self.match_pair(population, &mut rng)
            })
            .collect()
    }

    /// Run the passes configured in `params`, with its age groups. Without a
    /// configured seed a random master seed is used. Policies stay as built.
    pub fn run_configured(
        &mut self,
        population: &mut Population,
        params: &PairingParams,
    ) -> Result<Vec<PairingReport>> {
        params.validate()?;
        self.age_groups = Some((params.age_group_width, params.age_group_count));
        let master_seed = params.seed.unwrap_or_else(rand::random);
        self.run_passes(population, params.passes, master_seed)
    }

    /// One iteration of the match loop: draw a high-risk source, then a
    /// partner of the opposite sex.
    fn match_next<R: RandomSource>(
        &mut self,
        population: &mut Population,
        strata: &mut Strata,
        available: &mut AvailableAgeGroups,
        rng: &mut R,
        report: &mut PairingReport,
    ) -> Result<()> {
        let male_high = available.has_any(Sex::Male, RiskGroup::High);
        let female_high = available.has_any(Sex::Female, RiskGroup::High);
        let from_sex = if male_high && female_high {
            Sex::ALL[rng.uniform_int_inclusive(0, 1) as usize]
        } else if male_high {
            Sex::Male
        } else {
            Sex::Female
        };

        let sources = available.get(from_sex, RiskGroup::High);
        let from_pos = rng.uniform_index(sources.len());
        let from_stratum = stratum_index(from_sex, RiskGroup::High, sources[from_pos]);
        let from = strata.iterate(from_stratum).ok_or_else(|| {
            PairingError::InvariantViolation(format!(
                "source stratum {from_stratum} listed as available but exhausted"
            ))
        })?;
        if strata.array(from_stratum).all_drawn() {
            available.remove_at(from_sex, RiskGroup::High, from_pos);
        }

        let to_sex = from_sex.opposite();
        let to_risk = if available.has_any(to_sex, RiskGroup::High) {
            RiskGroup::High
        } else {
            RiskGroup::Low
        };
        let targets = available.get(to_sex, to_risk);
        if targets.is_empty() {
            warn!(%from, ?to_sex, "no partners left for source individual");
            report.unmatched_sources += 1;
            return Ok(());
        }

        let from_ind = population.get(from).ok_or_else(|| {
            PairingError::InvariantViolation(format!("{from} is not in the population"))
        })?;
        let to_pos = self.selector.select_age_group(targets, from_ind, &mut *rng);
        let to_age_group = *targets.get(to_pos).ok_or_else(|| {
            PairingError::InvariantViolation(format!(
                "selected age group position {to_pos} of {}",
                targets.len()
            ))
        })?;

        let to_stratum = stratum_index(to_sex, to_risk, to_age_group);
        let key = weighted_key(strata.array(to_stratum).remaining_weight(), rng);
        let to = strata.array_mut(to_stratum).binary_draw(key).ok_or_else(|| {
            PairingError::InvariantViolation(format!(
                "weighted draw with key {key} found nobody in stratum {to_stratum}"
            ))
        })?;
        if strata.array(to_stratum).all_drawn() {
            available.remove_at(to_sex, to_risk, to_pos);
        }

        let outcome = population.link(from, to).ok_or_else(|| {
            PairingError::InvariantViolation(format!("cannot link {from} and {to}"))
        })?;
        report.partnerships_formed += 1;
        report.displaced += outcome.displaced.len();
        debug!(
            %from,
            %to,
            from_stratum,
            to_stratum,
            key,
            displaced = outcome.displaced.len(),
            "partnership formed"
        );
        Ok(())
    }
}
