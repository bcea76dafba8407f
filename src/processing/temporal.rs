// src/processing/temporal.rs
//! Windowed statistics over every scalar metric
//!
//! The recording is cut into overlapping windows and each scalar metric is
//! recomputed per window with the same formulas the whole-channel summaries
//! use. Fewer than `min_windows_required` valid windows yields all-absent
//! statistics; a two-window mean would look authoritative while meaning
//! nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::parameters::TemporalParams;
use crate::processing::spectral::SpectralAnalyzer;
use crate::processing::windowing::Segmenter;
use crate::types::RawChannel;

/// Metric keys produced by the aggregator
pub mod metric {
    /// Envelope root-mean-square amplitude
    pub const RMS: &str = "rms";
    /// Envelope mean absolute value
    pub const MAV: &str = "mav";
    /// Mean power frequency
    pub const MPF: &str = "mean_power_frequency";
    /// Median frequency
    pub const MDF: &str = "median_frequency";
    /// Dimitrov fatigue index
    pub const FATIGUE_INDEX: &str = "fatigue_index";
}

/// Distribution of one metric across the session's windows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TemporalStats {
    /// Mean across valid windows
    pub mean: Option<f32>,
    /// Population standard deviation across valid windows
    pub std: Option<f32>,
    /// Smallest window value
    pub min: Option<f32>,
    /// Largest window value
    pub max: Option<f32>,
    /// std / mean, absent when the mean is zero
    pub coefficient_of_variation: Option<f32>,
    /// Number of windows the metric was computable in
    pub valid_window_count: usize,
}

impl TemporalStats {
    /// Summarize per-window values, requiring a minimum window count
    pub fn from_values(values: &[f32], min_required: usize) -> Self {
        let count = values.len();
        if count < min_required {
            return Self {
                valid_window_count: count,
                ..Self::default()
            };
        }

        let mean = values.iter().sum::<f32>() / count as f32;
        let std =
            (values.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / count as f32).sqrt();
        let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let coefficient_of_variation = if mean == 0.0 { None } else { Some(std / mean) };

        Self {
            mean: Some(mean),
            std: Some(std),
            min: Some(min),
            max: Some(max),
            coefficient_of_variation,
            valid_window_count: count,
        }
    }

    /// True when every statistic is absent
    pub fn is_absent(&self) -> bool {
        self.mean.is_none() && self.std.is_none() && self.min.is_none() && self.max.is_none()
    }
}

/// Windowed metric aggregator
pub struct TemporalAggregator {
    params: TemporalParams,
}

impl TemporalAggregator {
    /// Create an aggregator with the given parameters
    pub fn new(params: TemporalParams) -> Self {
        Self { params }
    }

    /// Per-metric windowed statistics for one channel
    ///
    /// Amplitude metrics come from the envelope, spectral metrics from the
    /// raw stream; validity is tracked per metric because a window can
    /// support one and not the other.
    pub fn aggregate(
        &self,
        channel: &RawChannel,
        envelope: Option<&[f32]>,
        spectral: &SpectralAnalyzer,
    ) -> BTreeMap<String, TemporalStats> {
        let segmenter = Segmenter::from_ms(
            self.params.window_ms,
            self.params.overlap_percent,
            channel.sample_rate_hz,
        );
        let windows = segmenter.segments(channel.samples.len());

        let mut rms_values = Vec::with_capacity(windows.len());
        let mut mav_values = Vec::with_capacity(windows.len());
        let mut mpf_values = Vec::with_capacity(windows.len());
        let mut mdf_values = Vec::with_capacity(windows.len());
        let mut fi_values = Vec::with_capacity(windows.len());

        for window in &windows {
            if let Some(env) = envelope {
                let slice = &env[window.clone()];
                let n = slice.len() as f32;
                rms_values.push((slice.iter().map(|&x| x * x).sum::<f32>() / n).sqrt());
                mav_values.push(slice.iter().map(|&x| x.abs()).sum::<f32>() / n);
            }

            let summary = spectral.analyze(&channel.samples[window.clone()], channel.sample_rate_hz);
            if let Some(mpf) = summary.mean_power_frequency {
                mpf_values.push(mpf);
            }
            if let Some(mdf) = summary.median_frequency {
                mdf_values.push(mdf);
            }
            if let Some(fi) = summary.fatigue_index {
                fi_values.push(fi);
            }
        }

        if windows.len() < self.params.min_windows_required {
            warn!(
                channel = %channel.label,
                windows = windows.len(),
                required = self.params.min_windows_required,
                "too few windows for temporal statistics"
            );
        }

        let min_required = self.params.min_windows_required;
        let mut stats = BTreeMap::new();
        stats.insert(
            metric::RMS.to_string(),
            TemporalStats::from_values(&rms_values, min_required),
        );
        stats.insert(
            metric::MAV.to_string(),
            TemporalStats::from_values(&mav_values, min_required),
        );
        stats.insert(
            metric::MPF.to_string(),
            TemporalStats::from_values(&mpf_values, min_required),
        );
        stats.insert(
            metric::MDF.to_string(),
            TemporalStats::from_values(&mdf_values, min_required),
        );
        stats.insert(
            metric::FATIGUE_INDEX.to_string(),
            TemporalStats::from_values(&fi_values, min_required),
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parameters::SpectralParams;
    use std::f32::consts::PI;

    fn sine_channel(freq: f32, n: usize, fs: f32) -> RawChannel {
        let samples = (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / fs).sin())
            .collect();
        RawChannel::new(samples, fs, "test")
    }

    fn aggregator() -> TemporalAggregator {
        TemporalAggregator::new(TemporalParams::default())
    }

    fn analyzer() -> SpectralAnalyzer {
        SpectralAnalyzer::new(SpectralParams::default())
    }

    #[test]
    fn test_enough_windows_reports_statistics() {
        // 6 s at 1 kHz: 11 one-second windows at 50% overlap
        let channel = sine_channel(80.0, 6000, 1000.0);
        let envelope = vec![0.5f32; 6000];
        let stats = aggregator().aggregate(&channel, Some(&envelope), &analyzer());

        let rms = &stats[metric::RMS];
        assert_eq!(rms.valid_window_count, 11);
        assert!((rms.mean.unwrap() - 0.5).abs() < 1e-4);
        assert!(rms.std.unwrap() < 1e-4);
        // constant envelope: nonzero mean, cv defined and ~0
        assert!(rms.coefficient_of_variation.unwrap() < 1e-3);

        let mdf = &stats[metric::MDF];
        assert_eq!(mdf.valid_window_count, 11);
        assert!((mdf.mean.unwrap() - 80.0).abs() < 5.0);
        assert!(stats[metric::FATIGUE_INDEX].mean.is_some());
    }

    #[test]
    fn test_too_few_windows_all_absent() {
        // 1.6 s: only 2 full windows
        let channel = sine_channel(80.0, 1600, 1000.0);
        let envelope = vec![0.5f32; 1600];
        let stats = aggregator().aggregate(&channel, Some(&envelope), &analyzer());

        let rms = &stats[metric::RMS];
        assert_eq!(rms.valid_window_count, 2);
        assert!(rms.is_absent());
        assert!(rms.coefficient_of_variation.is_none());
    }

    #[test]
    fn test_zero_mean_suppresses_cv_only() {
        let channel = sine_channel(80.0, 6000, 1000.0);
        let envelope = vec![0.0f32; 6000];
        let stats = aggregator().aggregate(&channel, Some(&envelope), &analyzer());

        let rms = &stats[metric::RMS];
        assert_eq!(rms.mean, Some(0.0));
        assert!(rms.coefficient_of_variation.is_none());
        assert_eq!(rms.min, Some(0.0));
    }

    #[test]
    fn test_missing_envelope_leaves_amplitude_absent() {
        let channel = sine_channel(80.0, 6000, 1000.0);
        let stats = aggregator().aggregate(&channel, None, &analyzer());

        assert_eq!(stats[metric::RMS].valid_window_count, 0);
        assert!(stats[metric::RMS].is_absent());
        // spectral metrics are unaffected
        assert!(stats[metric::MDF].mean.is_some());
    }

    #[test]
    fn test_stats_from_values_minimum() {
        let stats = TemporalStats::from_values(&[1.0, 2.0], 3);
        assert!(stats.is_absent());
        assert_eq!(stats.valid_window_count, 2);

        let stats = TemporalStats::from_values(&[1.0, 2.0, 3.0], 3);
        assert_eq!(stats.mean, Some(2.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
    }
}
