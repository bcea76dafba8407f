// src/processing/mvc.rs
//! MVC (maximum voluntary contraction) calibration
//!
//! Three-tier priority, first success wins: session metadata, patient
//! history, then self-calibration from the session's own envelope. A
//! supplied value only counts as a success when it is finite and positive.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::mvc;
use crate::config::session::ChannelOverrides;

/// Where an MVC reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MvcSource {
    /// Measured earlier in this session's protocol
    Metadata,
    /// Carried over from patient history
    PatientHistory,
    /// Estimated from the session envelope itself
    SelfCalibrated,
}

/// The amplitude reference defining 100% effort for one muscle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MvcEstimate {
    /// Reference amplitude in envelope units
    pub value: f32,
    /// Provenance tier
    pub source: MvcSource,
    /// Trust in the value, 0-1
    pub confidence: f32,
}

/// MVC calibrator
pub struct MvcCalibrator;

impl MvcCalibrator {
    /// Resolve the MVC reference for one channel
    ///
    /// `envelope` may be empty when conditioning failed; self-calibration
    /// then reports a zero value with zero confidence rather than failing.
    pub fn calibrate(envelope: &[f32], overrides: &ChannelOverrides) -> MvcEstimate {
        if let Some(value) = valid_reference(overrides.mvc_value) {
            return MvcEstimate {
                value,
                source: MvcSource::Metadata,
                confidence: mvc::METADATA_CONFIDENCE,
            };
        }

        if let Some(value) = valid_reference(overrides.mvc_history_value) {
            return MvcEstimate {
                value,
                source: MvcSource::PatientHistory,
                confidence: mvc::HISTORY_CONFIDENCE,
            };
        }

        Self::self_calibrate(envelope)
    }

    /// Estimate MVC as the 95th percentile of the session envelope
    fn self_calibrate(envelope: &[f32]) -> MvcEstimate {
        if envelope.is_empty() || !envelope.iter().any(|&x| x > 0.0) {
            return MvcEstimate {
                value: 0.0,
                source: MvcSource::SelfCalibrated,
                confidence: 0.0,
            };
        }

        let value = percentile(envelope, mvc::SELF_CALIBRATION_PERCENTILE);
        let confidence = Self::self_calibration_confidence(envelope, value);

        debug!(value, confidence, "self-calibrated MVC");

        MvcEstimate {
            value,
            source: MvcSource::SelfCalibrated,
            confidence,
        }
    }

    /// Composite of peak prominence, variability and duration consistency
    fn self_calibration_confidence(envelope: &[f32], peak: f32) -> f32 {
        let n = envelope.len() as f32;
        let mean = envelope.iter().sum::<f32>() / n;
        let rms = (envelope.iter().map(|&x| x * x).sum::<f32>() / n).sqrt();
        let std = (envelope.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / n).sqrt();

        // a real contraction session shows clear peaks above the baseline
        let prominence = if rms > 0.0 {
            ((peak / rms - 1.0) / (mvc::FULL_PROMINENCE_RATIO - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        // an erratic envelope makes the percentile less trustworthy
        let variability = if mean > 0.0 {
            (1.0 - (std / mean) / 2.0).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let consistency = Self::duration_consistency(envelope, peak);

        ((prominence + variability + consistency) / 3.0).clamp(0.0, 1.0)
    }

    /// Plausibility of contraction hold times at half the calibrated peak
    fn duration_consistency(envelope: &[f32], peak: f32) -> f32 {
        let threshold = peak * mvc::DURATION_PROBE_FACTOR;
        let mut runs: Vec<f32> = Vec::new();
        let mut current = 0usize;

        for &x in envelope {
            if x > threshold {
                current += 1;
            } else if current > 0 {
                runs.push(current as f32);
                current = 0;
            }
        }
        if current > 0 {
            runs.push(current as f32);
        }

        if runs.len() < 2 {
            // a single long hold carries no consistency signal either way
            return 0.5;
        }

        let mean = runs.iter().sum::<f32>() / runs.len() as f32;
        let std = (runs.iter().map(|&d| (d - mean).powi(2)).sum::<f32>() / runs.len() as f32).sqrt();
        if mean == 0.0 {
            return 0.0;
        }
        (1.0 - std / mean).clamp(0.0, 1.0)
    }
}

fn valid_reference(value: Option<f32>) -> Option<f32> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Linear-interpolation percentile over an unsorted slice
fn percentile(data: &[f32], pct: f32) -> f32 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = pct / 100.0 * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f32;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}
