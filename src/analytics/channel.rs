// src/analytics/channel.rs
//! Per-channel report assembly
//!
//! Pure aggregation: nothing here computes a new signal metric, it only
//! counts, rates and carries the pipeline outputs into one structured
//! report per channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::processing::detector::Contraction;
use crate::processing::mvc::MvcEstimate;
use crate::processing::spectral::SpectralSummary;
use crate::processing::temporal::TemporalStats;

/// Contraction tallies by quality flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractionCounts {
    /// All detected contractions
    pub total: usize,
    /// Contractions meeting both quality criteria
    pub good: usize,
    /// Intensity met, duration missed
    pub meets_intensity_only: usize,
    /// Duration met, intensity missed
    pub meets_duration_only: usize,
}

impl ContractionCounts {
    /// Tally a contraction list
    pub fn from_contractions(contractions: &[Contraction]) -> Self {
        let mut counts = Self {
            total: contractions.len(),
            ..Self::default()
        };
        for c in contractions {
            if c.is_good {
                counts.good += 1;
            } else if c.meets_intensity {
                counts.meets_intensity_only += 1;
            } else if c.meets_duration {
                counts.meets_duration_only += 1;
            }
        }
        counts
    }

    /// Contractions that met the intensity criterion, regardless of duration
    pub fn meets_intensity_total(&self) -> usize {
        self.good + self.meets_intensity_only
    }

    /// Contractions that met the duration criterion, regardless of intensity
    pub fn meets_duration_total(&self) -> usize {
        self.good + self.meets_duration_only
    }
}

/// Envelope amplitude summary for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeSummary {
    /// Mean envelope amplitude
    pub mean: f32,
    /// Envelope RMS
    pub rms: f32,
    /// Peak envelope amplitude
    pub peak: f32,
    /// Peak as a percentage of the MVC reference, absent without one
    pub peak_percent_mvc: Option<f32>,
}

impl AmplitudeSummary {
    /// Summarize an envelope against an optional MVC reference
    pub fn from_envelope(envelope: &[f32], mvc_value: f32) -> Option<Self> {
        if envelope.is_empty() {
            return None;
        }
        let n = envelope.len() as f32;
        let mean = envelope.iter().sum::<f32>() / n;
        let rms = (envelope.iter().map(|&x| x * x).sum::<f32>() / n).sqrt();
        let peak = envelope.iter().cloned().fold(0.0f32, f32::max);
        let peak_percent_mvc = (mvc_value > 0.0).then(|| peak / mvc_value * 100.0);

        Some(Self {
            mean,
            rms,
            peak,
            peak_percent_mvc,
        })
    }
}

/// Structured analytics report for one muscle channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnalytics {
    /// Channel label from the recording
    pub label: String,
    /// Sampling rate the channel was processed at
    pub sample_rate_hz: f32,
    /// Raw sample count
    pub sample_count: usize,
    /// Detected contractions, sorted, non-overlapping
    pub contractions: Vec<Contraction>,
    /// Quality tallies
    pub counts: ContractionCounts,
    /// good / total, 0 when no contractions were detected
    pub compliance_rate: f32,
    /// MVC reference used for the intensity flags
    pub mvc: MvcEstimate,
    /// Envelope amplitude summary, absent when conditioning failed
    pub amplitude: Option<AmplitudeSummary>,
    /// Whole-channel frequency-domain summary
    pub spectral: SpectralSummary,
    /// Windowed statistics keyed by metric name
    pub temporal: BTreeMap<String, TemporalStats>,
}

/// Assembles a [`ChannelAnalytics`] from pipeline outputs
pub struct ChannelAnalyticsBuilder {
    label: String,
    sample_rate_hz: f32,
    sample_count: usize,
    contractions: Vec<Contraction>,
    mvc: MvcEstimate,
    amplitude: Option<AmplitudeSummary>,
    spectral: SpectralSummary,
    temporal: BTreeMap<String, TemporalStats>,
}

impl ChannelAnalyticsBuilder {
    /// Start a report for one channel
    pub fn new(label: impl Into<String>, sample_rate_hz: f32, sample_count: usize, mvc: MvcEstimate) -> Self {
        Self {
            label: label.into(),
            sample_rate_hz,
            sample_count,
            contractions: Vec::new(),
            mvc,
            amplitude: None,
            spectral: SpectralSummary::absent(),
            temporal: BTreeMap::new(),
        }
    }

    /// Attach the detected contraction list
    pub fn contractions(mut self, contractions: Vec<Contraction>) -> Self {
        self.contractions = contractions;
        self
    }

    /// Attach the envelope amplitude summary
    pub fn amplitude(mut self, amplitude: Option<AmplitudeSummary>) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Attach the whole-channel spectral summary
    pub fn spectral(mut self, spectral: SpectralSummary) -> Self {
        self.spectral = spectral;
        self
    }

    /// Attach the windowed statistics
    pub fn temporal(mut self, temporal: BTreeMap<String, TemporalStats>) -> Self {
        self.temporal = temporal;
        self
    }

    /// Tally counts and produce the report
    pub fn build(self) -> ChannelAnalytics {
        let counts = ContractionCounts::from_contractions(&self.contractions);
        let compliance_rate = if counts.total == 0 {
            0.0
        } else {
            counts.good as f32 / counts.total as f32
        };

        ChannelAnalytics {
            label: self.label,
            sample_rate_hz: self.sample_rate_hz,
            sample_count: self.sample_count,
            contractions: self.contractions,
            counts,
            compliance_rate,
            mvc: self.mvc,
            amplitude: self.amplitude,
            spectral: self.spectral,
            temporal: self.temporal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mvc::MvcSource;

    fn contraction(meets_intensity: bool, meets_duration: bool) -> Contraction {
        Contraction {
            start_index: 0,
            end_index: 100,
            start_time_ms: 0.0,
            end_time_ms: 100.0,
            duration_ms: 100.0,
            max_amplitude: 1.0,
            meets_intensity,
            meets_duration,
            is_good: meets_intensity && meets_duration,
        }
    }

    fn mvc() -> MvcEstimate {
        MvcEstimate {
            value: 100.0,
            source: MvcSource::Metadata,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_counts_by_flag() {
        let contractions = vec![
            contraction(true, true),
            contraction(true, true),
            contraction(true, false),
            contraction(false, true),
            contraction(false, false),
        ];
        let counts = ContractionCounts::from_contractions(&contractions);
        assert_eq!(counts.total, 5);
        assert_eq!(counts.good, 2);
        assert_eq!(counts.meets_intensity_only, 1);
        assert_eq!(counts.meets_duration_only, 1);
        assert_eq!(counts.meets_intensity_total(), 3);
        assert_eq!(counts.meets_duration_total(), 3);
    }

    #[test]
    fn test_compliance_rate() {
        let analytics = ChannelAnalyticsBuilder::new("left", 1000.0, 5000, mvc())
            .contractions(vec![
                contraction(true, true),
                contraction(true, false),
                contraction(false, false),
            ])
            .build();
        assert!((analytics.compliance_rate - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_compliance_rate_zero_when_empty() {
        let analytics = ChannelAnalyticsBuilder::new("left", 1000.0, 5000, mvc()).build();
        assert_eq!(analytics.compliance_rate, 0.0);
        assert_eq!(analytics.counts.total, 0);
    }

    #[test]
    fn test_amplitude_summary() {
        let envelope = vec![0.0, 40.0, 80.0, 40.0, 0.0];
        let summary = AmplitudeSummary::from_envelope(&envelope, 100.0).unwrap();
        assert_eq!(summary.peak, 80.0);
        assert_eq!(summary.peak_percent_mvc, Some(80.0));
        assert_eq!(summary.mean, 32.0);

        let summary = AmplitudeSummary::from_envelope(&envelope, 0.0).unwrap();
        assert!(summary.peak_percent_mvc.is_none());

        assert!(AmplitudeSummary::from_envelope(&[], 100.0).is_none());
    }
}
