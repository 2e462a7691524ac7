//! Individual records
//!
//! Individuals live in a [`super::Population`] arena and refer to each other by
//! [`IndividualId`], never by reference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of five-year age groups tracked by the pairing strata.
pub const AGE_GROUP_COUNT: usize = 24;

/// Default width of an age group in years.
pub const AGE_GROUP_WIDTH: u32 = 5;

/// Arena index of an individual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndividualId(pub usize);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Individual#{}", self.0)
    }
}

/// Biological sex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn index(self) -> usize {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }

    pub fn opposite(self) -> Sex {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

/// Sexual-risk behaviour group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskGroup {
    Low,
    High,
}

impl RiskGroup {
    pub const ALL: [RiskGroup; 2] = [RiskGroup::Low, RiskGroup::High];

    pub fn index(self) -> usize {
        match self {
            RiskGroup::Low => 0,
            RiskGroup::High => 1,
        }
    }
}

/// Age group of `age` for groups `width` years wide, capped at the last of
/// `count` groups.
pub fn age_group_for(age: u32, width: u32, count: usize) -> usize {
    let group = (age / width.max(1)) as usize;
    group.min(count.saturating_sub(1))
}

/// One member of the simulated population.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub sex: Sex,
    pub age: u32,
    pub age_group: usize,
    pub risk_group: RiskGroup,
    /// Set by the last matching pass: whether the individual took part.
    pub eligible: bool,
    pub partner: Option<IndividualId>,
}

impl Individual {
    /// Create an unpartnered individual with the default five-year age groups.
    pub fn new(id: IndividualId, sex: Sex, age: u32, risk_group: RiskGroup) -> Self {
        Individual {
            id,
            sex,
            age,
            age_group: age_group_for(age, AGE_GROUP_WIDTH, AGE_GROUP_COUNT),
            risk_group,
            eligible: false,
            partner: None,
        }
    }

    pub fn is_partnered(&self) -> bool {
        self.partner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_groups() {
        assert_eq!(age_group_for(0, 5, 24), 0);
        assert_eq!(age_group_for(22, 5, 24), 4);
        assert_eq!(age_group_for(45, 5, 24), 9);
        assert_eq!(age_group_for(119, 5, 24), 23);
        assert_eq!(age_group_for(30, 10, 3), 2);
    }

    #[test]
    fn test_opposite_sex() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite().index(), 0);
    }

    #[test]
    fn test_new_individual_is_single() {
        let ind = Individual::new(IndividualId(3), Sex::Female, 46, RiskGroup::High);
        assert_eq!(ind.age_group, 9);
        assert!(!ind.is_partnered());
        assert_eq!(ind.id.to_string(), "Individual#3");
    }
}
