//! Configuration parameters for pair matching

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::population::{age_group_for, AGE_GROUP_COUNT, AGE_GROUP_WIDTH};

/// Sampling weight given to ages in `[min_age, max_age)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightBand {
    pub min_age: u32,
    pub max_age: u32,
    pub weight: f64,
}

impl WeightBand {
    pub fn new(min_age: u32, max_age: u32, weight: f64) -> Self {
        WeightBand {
            min_age,
            max_age,
            weight,
        }
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && age < self.max_age
    }
}

/// Main configuration for matching passes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingParams {
    // Strata
    /// Width of an age group in years
    pub age_group_width: u32,
    /// Number of age groups (at most 24)
    pub age_group_count: usize,

    // Weights
    /// Age bands checked in order; the first match gives the weight
    pub weight_bands: Vec<WeightBand>,
    /// Weight for ages outside every band
    pub fallback_weight: f64,

    // Runs
    /// Master seed; passes derive their own seeds from it
    pub seed: Option<u64>,
    /// Number of matching passes over the same population
    pub passes: u32,
}

impl Default for PairingParams {
    fn default() -> Self {
        PairingParams {
            age_group_width: AGE_GROUP_WIDTH,
            age_group_count: AGE_GROUP_COUNT,

            weight_bands: vec![WeightBand::new(15, 40, 3.0), WeightBand::new(40, 50, 2.0)],
            fallback_weight: 1.0,

            seed: None,
            passes: 1,
        }
    }
}

impl PairingParams {
    /// Parse parameters from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: PairingParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("reading {}", path.display()), e))?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.age_group_width == 0 {
            return Err(ConfigError::Invalid("age_group_width must be positive".into()));
        }
        if self.age_group_count == 0 || self.age_group_count > AGE_GROUP_COUNT {
            return Err(ConfigError::Invalid(format!(
                "age_group_count must be between 1 and {AGE_GROUP_COUNT}, got {}",
                self.age_group_count
            )));
        }
        if !(self.fallback_weight > 0.0 && self.fallback_weight.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "fallback_weight must be positive, got {}",
                self.fallback_weight
            )));
        }
        for band in &self.weight_bands {
            if !(band.weight > 0.0 && band.weight.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "weight for ages {}..{} must be positive, got {}",
                    band.min_age, band.max_age, band.weight
                )));
            }
            if band.min_age >= band.max_age {
                return Err(ConfigError::Invalid(format!(
                    "empty age band {}..{}",
                    band.min_age, band.max_age
                )));
            }
        }
        Ok(())
    }

    /// Weight of an individual of the given age.
    pub fn weight_for_age(&self, age: u32) -> f64 {
        self.weight_bands
            .iter()
            .find(|band| band.contains(age))
            .map_or(self.fallback_weight, |band| band.weight)
    }

    /// Age group of the given age under these parameters.
    pub fn age_group(&self, age: u32) -> usize {
        age_group_for(age, self.age_group_width, self.age_group_count)
    }
}
