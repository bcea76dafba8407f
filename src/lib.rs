//! EMG-Rehab-Core: therapy-session EMG analytics for BFR rehabilitation
//!
//! This library turns raw multi-channel EMG voltage recordings from
//! rehabilitation therapy sessions into clinically meaningful metrics:
//!
//! - Signal conditioning (Butterworth filtering, rectification, envelope)
//! - Contraction detection with intensity/duration quality flags
//! - MVC calibration with a three-tier reference priority
//! - Frequency-domain fatigue descriptors (MPF, MDF, Dimitrov index)
//! - Windowed temporal statistics for every scalar metric
//! - A composite performance score gated by BFR pressure safety
//!
//! Processing is batch: each run consumes one complete, finite recording.
//! Channels are processed independently and in parallel; scoring is the
//! only point that needs both.
//!
//! # Quick Start
//!
//! ```rust
//! use emg_rehab_core::{
//!     ProcessingParameters, RawChannel, SessionAnalyzer, SessionInput, SessionParameters,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let samples: Vec<f32> = (0..4000)
//!         .map(|i| (2.0 * std::f32::consts::PI * 80.0 * i as f32 / 1000.0).sin())
//!         .collect();
//!
//!     let input = SessionInput {
//!         left: RawChannel::new(samples.clone(), 1000.0, "left_vastus"),
//!         right: RawChannel::new(samples, 1000.0, "right_vastus"),
//!         left_activated: None,
//!         right_activated: None,
//!     };
//!
//!     let analyzer =
//!         SessionAnalyzer::new(ProcessingParameters::default(), SessionParameters::default())?;
//!     let analysis = analyzer.analyze(&input)?;
//!
//!     println!("contractions: {}", analysis.left.counts.total);
//!     println!("overall score: {:.1}", analysis.score.overall);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod config;
pub mod error;
pub mod processing;
pub mod types;

// Re-export commonly used types for convenience
pub use analytics::{
    ChannelAnalytics, ChannelAnalyticsBuilder, PerformanceScore, PerformanceScorer, ScoringError,
    SessionAnalysis, SessionAnalyzer, SessionInput,
};
pub use config::{
    ProcessingParameters, ScoringWeights, SessionOverrides, SessionParameters, ThresholdProfile,
};
pub use error::{AnalysisError, AnalysisResult};
pub use processing::{
    ConditionedSignal, Contraction, ContractionDetector, MvcCalibrator, MvcEstimate, MvcSource,
    SignalConditioner, SpectralAnalyzer, SpectralSummary, TemporalAggregator, TemporalStats,
};
pub use types::RawChannel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "emg-rehab-core");
    }
}
