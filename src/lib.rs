//! Partnership matching library
//!
//! Weighted sampling without replacement over cumulative probability arrays,
//! and the matcher that pairs individuals of a microsimulation population
//! with it.

pub mod cpa;
pub mod error;
pub mod pairing;
pub mod params;
pub mod population;
pub mod rng;

pub use cpa::{Cpa, CpaIterator};
pub use error::{CpaError, PairingError};
pub use pairing::{PairingOrchestrator, PairingReport};
pub use params::PairingParams;
pub use population::{Individual, IndividualId, Population, RiskGroup, Sex};
