//! Error types for pair matching.
//!
//! Construction failures of a cumulative probability array are recoverable
//! status values. A draw that comes back empty on a stratum the orchestrator
//! has already checked is a broken internal invariant and aborts the pass.

use thiserror::Error;

use crate::population::IndividualId;

/// Construction status of a cumulative probability array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CpaError {
    #[error("cumulative probability array requested with zero capacity")]
    ZeroCapacity,

    #[error("could not allocate storage for {requested} entries")]
    OutOfMemory { requested: usize },
}

/// Configuration errors raised while loading or validating [`crate::params::PairingParams`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pairing parameters: {0}")]
    Invalid(String),

    #[error("could not parse pairing parameters: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors that abort a matching pass.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("stratum array unusable: {0}")]
    Cpa(#[from] CpaError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("weight generator returned {weight} for {id}; weights must be positive")]
    InvalidWeight { id: IndividualId, weight: f64 },

    #[error("{id} has age group {age_group}, outside the {limit} pairing age groups")]
    AgeGroupOutOfRange {
        id: IndividualId,
        age_group: usize,
        limit: usize,
    },

    /// A stratum that was verified non-empty produced no individual.
    #[error("pairing invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type alias for pairing operations.
pub type Result<T> = std::result::Result<T, PairingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpa_error_converts_into_pairing_error() {
        let err: PairingError = CpaError::ZeroCapacity.into();
        assert!(matches!(err, PairingError::Cpa(CpaError::ZeroCapacity)));
        assert!(err.to_string().contains("zero capacity"));
    }

    #[test]
    fn test_invalid_weight_message_names_individual() {
        let err = PairingError::InvalidWeight {
            id: IndividualId(4),
            weight: 0.0,
        };
        assert!(err.to_string().contains("Individual#4"));
    }

    #[test]
    fn test_io_error_keeps_context() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ConfigError::io("reading params.json", source);
        assert_eq!(err.to_string(), "IO error: reading params.json");
        assert!(std::error::Error::source(&err).is_some());
    }
}
