// src/analytics/session.rs
//! Whole-session orchestration
//!
//! Runs the per-channel pipeline on both muscles and joins the results into
//! the composite score. The two channels have no data dependency, so they
//! run on worker threads via `rayon::join`; scoring is the only
//! synchronization point. A channel whose conditioning soft-fails produces a
//! degraded report (no contractions, absent summaries) instead of voiding
//! the session.

use rayon::join;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::channel::{AmplitudeSummary, ChannelAnalytics, ChannelAnalyticsBuilder};
use crate::analytics::scoring::{PerformanceScore, PerformanceScorer};
use crate::config::parameters::{ParameterError, ProcessingParameters};
use crate::config::session::{ChannelOverrides, SessionParameters};
use crate::error::AnalysisError;
use crate::processing::conditioner::{ConditioningError, SignalConditioner};
use crate::processing::detector::ContractionDetector;
use crate::processing::mvc::MvcCalibrator;
use crate::processing::spectral::SpectralAnalyzer;
use crate::processing::temporal::TemporalAggregator;
use crate::types::RawChannel;

/// Complete input for one session run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    /// Left-muscle raw channel
    pub left: RawChannel,
    /// Right-muscle raw channel
    pub right: RawChannel,
    /// Optional pre-filtered timing stream for the left channel
    pub left_activated: Option<Vec<f32>>,
    /// Optional pre-filtered timing stream for the right channel
    pub right_activated: Option<Vec<f32>>,
}

/// Everything one session run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    /// Left-muscle report
    pub left: ChannelAnalytics,
    /// Right-muscle report
    pub right: ChannelAnalytics,
    /// Composite session score
    pub score: PerformanceScore,
}

/// Batch analyzer for one resolved parameter set
pub struct SessionAnalyzer {
    processing: ProcessingParameters,
    session: SessionParameters,
}

impl SessionAnalyzer {
    /// Create an analyzer, validating the processing parameters up front
    pub fn new(
        processing: ProcessingParameters,
        session: SessionParameters,
    ) -> Result<Self, ParameterError> {
        processing.validate()?;
        Ok(Self {
            processing,
            session,
        })
    }

    /// Run the full pipeline on both channels and score the session
    pub fn analyze(&self, input: &SessionInput) -> Result<SessionAnalysis, AnalysisError> {
        let (left, right) = join(
            || {
                self.analyze_channel(
                    &input.left,
                    input.left_activated.as_deref(),
                    &self.session.left,
                )
            },
            || {
                self.analyze_channel(
                    &input.right,
                    input.right_activated.as_deref(),
                    &self.session.right,
                )
            },
        );
        let (left, right) = (left?, right?);

        let score = PerformanceScorer::score(Some(&left), Some(&right), &self.session)?;

        info!(
            left_total = left.counts.total,
            right_total = right.counts.total,
            overall = score.overall,
            gate = score.bfr_safety_gate,
            "session analyzed"
        );

        Ok(SessionAnalysis { left, right, score })
    }

    /// Run the per-channel pipeline for one muscle
    ///
    /// Insufficient or flat signals degrade to an empty report; every other
    /// conditioning failure is a hard error.
    pub fn analyze_channel(
        &self,
        channel: &RawChannel,
        activated: Option<&[f32]>,
        overrides: &ChannelOverrides,
    ) -> Result<ChannelAnalytics, AnalysisError> {
        let conditioner = SignalConditioner::new(self.processing.conditioner.clone());
        let conditioned = match conditioner.condition(channel, activated) {
            Ok(conditioned) => Some(conditioned),
            Err(
                err @ (ConditioningError::InsufficientSamples { .. }
                | ConditioningError::FlatSignal { .. }),
            ) => {
                warn!(channel = %channel.label, error = %err, "channel degraded");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let envelope = conditioned.as_ref().map(|c| c.envelope.as_slice());
        let mvc = MvcCalibrator::calibrate(envelope.unwrap_or(&[]), overrides);

        let mut detector_params = self.processing.detector.clone();
        if let Some(duration_ms) = overrides.duration_threshold_ms {
            detector_params.duration_threshold_ms = duration_ms;
        }

        let contractions = match &conditioned {
            Some(conditioned) => ContractionDetector::new(detector_params).detect(
                conditioned,
                channel.sample_rate_hz,
                &mvc,
            )?,
            None => Vec::new(),
        };

        let spectral_analyzer = SpectralAnalyzer::new(self.processing.spectral.clone());
        let spectral = spectral_analyzer.analyze(&channel.samples, channel.sample_rate_hz);

        let temporal = TemporalAggregator::new(self.processing.temporal.clone()).aggregate(
            channel,
            envelope,
            &spectral_analyzer,
        );

        let amplitude = envelope.and_then(|env| AmplitudeSummary::from_envelope(env, mvc.value));

        Ok(
            ChannelAnalyticsBuilder::new(&channel.label, channel.sample_rate_hz, channel.samples.len(), mvc)
                .contractions(contractions)
                .amplitude(amplitude)
                .spectral(spectral)
                .temporal(temporal)
                .build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    // 80 Hz carrier gated into three-second holds with one-second rests
    fn burst_channel(bursts: usize, label: &str) -> RawChannel {
        const FS: f32 = 1000.0;
        let mut samples = Vec::new();
        for _ in 0..bursts {
            samples.extend((0..1000).map(|_| 0.0f32));
            let offset = samples.len();
            samples.extend(
                (0..3000).map(|i| (2.0 * PI * 80.0 * (offset + i) as f32 / FS).sin()),
            );
        }
        samples.extend((0..1000).map(|_| 0.0f32));
        RawChannel::new(samples, FS, label)
    }

    fn session() -> SessionParameters {
        SessionParameters {
            target_contractions: 3,
            bfr_pressure_percent: Some(50.0),
            effort_rating: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_session_detects_bursts() {
        let input = SessionInput {
            left: burst_channel(3, "left"),
            right: burst_channel(3, "right"),
            left_activated: None,
            right_activated: None,
        };
        let analyzer =
            SessionAnalyzer::new(ProcessingParameters::default(), session()).unwrap();
        let analysis = analyzer.analyze(&input).unwrap();

        assert_eq!(analysis.left.counts.total, 3);
        assert_eq!(analysis.right.counts.total, 3);
        assert!(analysis.left.contractions.iter().all(|c| c.meets_duration));
        assert!(analysis.score.bfr_safety_gate);
        assert!(analysis.score.overall > 0.0);
    }

    #[test]
    fn test_flat_channel_degrades_not_fails() {
        let input = SessionInput {
            left: RawChannel::new(vec![0.0; 13_000], 1000.0, "left"),
            right: burst_channel(3, "right"),
            left_activated: None,
            right_activated: None,
        };
        let analyzer =
            SessionAnalyzer::new(ProcessingParameters::default(), session()).unwrap();
        let analysis = analyzer.analyze(&input).unwrap();

        assert_eq!(analysis.left.counts.total, 0);
        assert!(analysis.left.amplitude.is_none());
        assert_eq!(analysis.left.mvc.confidence, 0.0);
        // healthy channel unaffected
        assert_eq!(analysis.right.counts.total, 3);
    }

    #[test]
    fn test_per_muscle_duration_override() {
        let mut params = session();
        // left must hold 10 s, nothing qualifies on duration
        params.left.duration_threshold_ms = Some(10_000.0);
        let input = SessionInput {
            left: burst_channel(3, "left"),
            right: burst_channel(3, "right"),
            left_activated: None,
            right_activated: None,
        };
        let analyzer = SessionAnalyzer::new(ProcessingParameters::default(), params).unwrap();
        let analysis = analyzer.analyze(&input).unwrap();

        assert!(analysis.left.contractions.iter().all(|c| !c.meets_duration));
        assert!(analysis.right.contractions.iter().all(|c| c.meets_duration));
    }

    #[test]
    fn test_invalid_processing_parameters_rejected_up_front() {
        let mut params = ProcessingParameters::default();
        params.detector.mvc_threshold_percent = 150.0;
        assert!(SessionAnalyzer::new(params, session()).is_err());
    }
}
