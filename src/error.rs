// src/error.rs
//! Unified error handling for the analytics core
//!
//! Hard failures (bad configuration, invalid scoring weights, missing
//! channel reports) surface as `AnalysisError`. Soft per-channel failures
//! (too few samples, flat signal, too few temporal windows) never appear
//! here: they are absent fields in the normal result shape.

use thiserror::Error;

use crate::analytics::scoring::ScoringError;
use crate::config::parameters::ParameterError;
use crate::processing::conditioner::ConditioningError;
use crate::processing::filters::FilterError;

/// Crate-level error type
///
/// Every component-specific error converts into this so callers can hold a
/// single error type across the whole pipeline invocation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Signal conditioning rejected a channel outright
    #[error(transparent)]
    Conditioning(#[from] ConditioningError),

    /// Digital filter design failed
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Configuration value out of its documented range
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Session scoring failed
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Result type alias for analytics operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnalysisError>();
    }

    #[test]
    fn test_error_conversion() {
        let err: AnalysisError = ConditioningError::InsufficientSamples {
            got: 10,
            required: 1000,
        }
        .into();
        assert!(matches!(err, AnalysisError::Conditioning(_)));
        assert!(err.to_string().contains("10"));
    }
}
