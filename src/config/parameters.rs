// src/config/parameters.rs
//! Fully-resolved processing parameters
//!
//! The pipeline never consults multiple configuration sources: callers merge
//! session overrides and profile files into one `ProcessingParameters` value
//! up front and pass it explicitly into each component. Every numeric field
//! is range-checked by [`ProcessingParameters::validate`], which each
//! component re-invokes at its point of use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::{conditioning, detection, spectral, temporal};

/// Configuration value errors
#[derive(Debug, Clone, Error)]
pub enum ParameterError {
    /// A numeric parameter fell outside its documented range
    #[error("parameter `{name}` = {value} outside valid range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A TOML profile failed to parse
    #[error("parameter profile parse error: {0}")]
    Parse(String),
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ParameterError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ParameterError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Signal conditioning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionerParams {
    /// High-pass Butterworth cutoff in Hz
    pub highpass_cutoff_hz: f32,
    /// Low-pass Butterworth cutoff in Hz
    pub lowpass_cutoff_hz: f32,
    /// Butterworth order for both filter stages (even, 2-8)
    pub filter_order: usize,
    /// Moving-RMS envelope window in ms
    pub envelope_window_ms: f32,
    /// Envelope window overlap in percent
    pub envelope_overlap_percent: f32,
    /// Channels shorter than this are rejected
    pub min_sample_count: usize,
    /// Variance floor below which the channel counts as flat
    pub flat_variance_threshold: f32,
}

impl Default for ConditionerParams {
    fn default() -> Self {
        Self {
            highpass_cutoff_hz: conditioning::HIGHPASS_CUTOFF_HZ,
            lowpass_cutoff_hz: conditioning::LOWPASS_CUTOFF_HZ,
            filter_order: conditioning::FILTER_ORDER,
            envelope_window_ms: conditioning::ENVELOPE_WINDOW_MS,
            envelope_overlap_percent: conditioning::ENVELOPE_OVERLAP_PERCENT,
            min_sample_count: conditioning::MIN_SAMPLE_COUNT,
            flat_variance_threshold: conditioning::FLAT_SIGNAL_VARIANCE,
        }
    }
}

impl ConditionerParams {
    /// Range-check all fields
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_range("highpass_cutoff_hz", self.highpass_cutoff_hz, 0.1, 1000.0)?;
        check_range("lowpass_cutoff_hz", self.lowpass_cutoff_hz, 0.1, 1000.0)?;
        check_range("filter_order", self.filter_order as f32, 2.0, 8.0)?;
        if self.filter_order % 2 != 0 {
            return Err(ParameterError::OutOfRange {
                name: "filter_order",
                value: self.filter_order as f32,
                min: 2.0,
                max: 8.0,
            });
        }
        check_range("envelope_window_ms", self.envelope_window_ms, 1.0, 1000.0)?;
        check_range(
            "envelope_overlap_percent",
            self.envelope_overlap_percent,
            0.0,
            90.0,
        )?;
        Ok(())
    }
}

/// Which envelope-only threshold profile the detector runs with
///
/// Two historically documented defaults exist for envelope-only detection;
/// they are distinct profiles and are never averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdProfile {
    /// Current clinical default (10% of stream maximum)
    #[default]
    Standard,
    /// Legacy alternate (30% of stream maximum)
    Legacy,
}

impl ThresholdProfile {
    /// Envelope-only threshold factor for this profile
    pub fn envelope_factor(self) -> f32 {
        match self {
            ThresholdProfile::Standard => detection::ENVELOPE_THRESHOLD_FACTOR,
            ThresholdProfile::Legacy => detection::LEGACY_ENVELOPE_THRESHOLD_FACTOR,
        }
    }
}

/// Contraction detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Threshold factor applied to a dedicated temporal stream
    pub temporal_threshold_factor: f32,
    /// Profile selecting the envelope-only threshold factor
    pub threshold_profile: ThresholdProfile,
    /// Candidates shorter than this are dropped, ms
    pub min_duration_ms: f32,
    /// Candidates with gaps at or below this are merged, ms
    pub merge_threshold_ms: f32,
    /// Window after an interval end that absorbs new rising edges, ms
    pub refractory_period_ms: f32,
    /// Percent of MVC required for `meets_intensity`
    pub mvc_threshold_percent: f32,
    /// Hold time required for `meets_duration`, ms
    pub duration_threshold_ms: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            temporal_threshold_factor: detection::TEMPORAL_THRESHOLD_FACTOR,
            threshold_profile: ThresholdProfile::Standard,
            min_duration_ms: detection::MIN_DURATION_MS,
            merge_threshold_ms: detection::MERGE_THRESHOLD_MS,
            refractory_period_ms: detection::REFRACTORY_PERIOD_MS,
            mvc_threshold_percent: detection::MVC_THRESHOLD_PERCENT,
            duration_threshold_ms: detection::DURATION_THRESHOLD_MS,
        }
    }
}

impl DetectorParams {
    /// Range-check all fields
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_range(
            "temporal_threshold_factor",
            self.temporal_threshold_factor,
            1e-4,
            1.0,
        )?;
        check_range("min_duration_ms", self.min_duration_ms, 0.0, 10_000.0)?;
        check_range("merge_threshold_ms", self.merge_threshold_ms, 0.0, 10_000.0)?;
        check_range(
            "refractory_period_ms",
            self.refractory_period_ms,
            0.0,
            10_000.0,
        )?;
        // 0 < mvc_threshold_percentage <= 100
        if !(self.mvc_threshold_percent > 0.0 && self.mvc_threshold_percent <= 100.0) {
            return Err(ParameterError::OutOfRange {
                name: "mvc_threshold_percent",
                value: self.mvc_threshold_percent,
                min: 0.0,
                max: 100.0,
            });
        }
        check_range(
            "duration_threshold_ms",
            self.duration_threshold_ms,
            0.0,
            60_000.0,
        )?;
        Ok(())
    }
}

/// Spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralParams {
    /// Minimum sample count for any spectral estimate
    pub min_sample_count: usize,
    /// Welch segment length cap
    pub max_segment_len: usize,
    /// Welch segment overlap, 0-0.9
    pub segment_overlap: f32,
    /// Variance floor below which the spectrum is not computed
    pub flat_variance_threshold: f32,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self {
            min_sample_count: spectral::MIN_SAMPLE_COUNT,
            max_segment_len: spectral::MAX_SEGMENT_LEN,
            segment_overlap: spectral::SEGMENT_OVERLAP,
            flat_variance_threshold: spectral::FLAT_SIGNAL_VARIANCE,
        }
    }
}

impl SpectralParams {
    /// Range-check all fields
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_range(
            "min_sample_count",
            self.min_sample_count as f32,
            16.0,
            1e9,
        )?;
        check_range("max_segment_len", self.max_segment_len as f32, 16.0, 65_536.0)?;
        check_range("segment_overlap", self.segment_overlap, 0.0, 0.9)?;
        Ok(())
    }
}

/// Temporal aggregation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalParams {
    /// Aggregation window length, ms
    pub window_ms: f32,
    /// Window overlap in percent
    pub overlap_percent: f32,
    /// Minimum valid windows before statistics are reported
    pub min_windows_required: usize,
}

impl Default for TemporalParams {
    fn default() -> Self {
        Self {
            window_ms: temporal::WINDOW_MS,
            overlap_percent: temporal::OVERLAP_PERCENT,
            min_windows_required: temporal::MIN_WINDOWS_REQUIRED,
        }
    }
}

impl TemporalParams {
    /// Range-check all fields
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_range("window_ms", self.window_ms, 10.0, 60_000.0)?;
        check_range("overlap_percent", self.overlap_percent, 0.0, 90.0)?;
        check_range(
            "min_windows_required",
            self.min_windows_required as f32,
            1.0,
            1000.0,
        )?;
        Ok(())
    }
}

/// Complete, resolved parameter set for one pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    /// Signal conditioning stage
    pub conditioner: ConditionerParams,
    /// Contraction detection stage
    pub detector: DetectorParams,
    /// Spectral analysis stage
    pub spectral: SpectralParams,
    /// Temporal aggregation stage
    pub temporal: TemporalParams,
}

impl ProcessingParameters {
    /// Validate every stage's parameters
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.conditioner.validate()?;
        self.detector.validate()?;
        self.spectral.validate()?;
        self.temporal.validate()?;
        Ok(())
    }

    /// Parse a parameter profile from a TOML document
    ///
    /// Missing keys keep their compiled defaults. The core never reads files
    /// itself; the caller supplies the document content.
    pub fn from_toml_str(doc: &str) -> Result<Self, ParameterError> {
        let params: Self =
            toml::from_str(doc).map_err(|e| ParameterError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ProcessingParameters::default().validate().is_ok());
    }

    #[test]
    fn test_mvc_threshold_rejects_zero() {
        let mut params = DetectorParams::default();
        params.mvc_threshold_percent = 0.0;
        assert!(params.validate().is_err());
        params.mvc_threshold_percent = 100.0;
        assert!(params.validate().is_ok());
        params.mvc_threshold_percent = 100.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_odd_filter_order_rejected() {
        let mut params = ConditionerParams::default();
        params.filter_order = 3;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_threshold_profiles_are_distinct() {
        assert_eq!(ThresholdProfile::Standard.envelope_factor(), 0.10);
        assert_eq!(ThresholdProfile::Legacy.envelope_factor(), 0.30);
    }

    #[test]
    fn test_from_toml_str_partial_profile() {
        let doc = r#"
            [detector]
            threshold_profile = "legacy"
            duration_threshold_ms = 1500.0
        "#;
        let params = ProcessingParameters::from_toml_str(doc).unwrap();
        assert_eq!(params.detector.threshold_profile, ThresholdProfile::Legacy);
        assert_eq!(params.detector.duration_threshold_ms, 1500.0);
        // untouched sections keep defaults
        assert_eq!(params.conditioner.highpass_cutoff_hz, 20.0);
    }

    #[test]
    fn test_from_toml_str_rejects_bad_values() {
        let doc = r#"
            [detector]
            mvc_threshold_percent = 250.0
        "#;
        assert!(ProcessingParameters::from_toml_str(doc).is_err());
    }
}
