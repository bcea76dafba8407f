// src/processing/conditioner.rs
//! Signal conditioning: raw EMG voltage to amplitude envelope
//!
//! Chain: 4th-order high-pass Butterworth at 20 Hz (DC offset, motion
//! artifact), full-wave rectification, 4th-order low-pass Butterworth at
//! 10 Hz, then a 50 ms moving-RMS pass that yields the envelope used for
//! every amplitude decision downstream.
//!
//! Some recordings carry an independently pre-filtered "activated" stream
//! with roughly twice the SNR of anything this chain can recover; when
//! present it is passed through untouched as the `temporal` stream and used
//! only for contraction timing.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::parameters::ConditionerParams;
use crate::processing::filters::{ButterworthFilter, FilterError};
use crate::types::{variance, RawChannel};

/// Conditioning failures, soft at the session level
///
/// A failed channel yields an absent `ConditionedSignal`; sibling channels
/// are unaffected.
#[derive(Debug, Clone, Error)]
pub enum ConditioningError {
    /// Too few samples to produce a meaningful envelope
    #[error("insufficient samples: got {got}, need at least {required}")]
    InsufficientSamples { got: usize, required: usize },

    /// Signal variance below the flat-signal floor (dead electrode)
    #[error("flat signal: variance {variance:.3e}")]
    FlatSignal { variance: f32 },

    /// Activated stream length does not match the raw samples
    #[error("temporal stream length {temporal} does not match sample count {samples}")]
    LengthMismatch { samples: usize, temporal: usize },

    /// Filter design rejected the configured cutoffs for this sample rate
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Conditioned per-channel signal streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionedSignal {
    /// Amplitude envelope, same length as the raw input
    pub envelope: Vec<f32>,
    /// Optional pre-filtered stream reserved for contraction timing
    pub temporal: Option<Vec<f32>>,
}

impl ConditionedSignal {
    /// The stream contraction timing should run on
    ///
    /// The dedicated temporal stream when present, the envelope otherwise.
    pub fn timing_stream(&self) -> &[f32] {
        self.temporal.as_deref().unwrap_or(&self.envelope)
    }

    /// Whether a dedicated temporal stream is present
    pub fn has_temporal(&self) -> bool {
        self.temporal.is_some()
    }
}

/// Signal conditioner for one parameter set
pub struct SignalConditioner {
    params: ConditionerParams,
}

impl SignalConditioner {
    /// Create a conditioner with the given parameters
    pub fn new(params: ConditionerParams) -> Self {
        Self { params }
    }

    /// Run the conditioning chain on one channel
    ///
    /// `activated` is the optional pre-filtered timing stream; it must match
    /// the raw sample count when present.
    pub fn condition(
        &self,
        channel: &RawChannel,
        activated: Option<&[f32]>,
    ) -> Result<ConditionedSignal, ConditioningError> {
        let samples = &channel.samples;

        if samples.len() < self.params.min_sample_count {
            return Err(ConditioningError::InsufficientSamples {
                got: samples.len(),
                required: self.params.min_sample_count,
            });
        }

        let var = variance(samples);
        if var < self.params.flat_variance_threshold {
            return Err(ConditioningError::FlatSignal { variance: var });
        }

        if let Some(stream) = activated {
            if stream.len() != samples.len() {
                return Err(ConditioningError::LengthMismatch {
                    samples: samples.len(),
                    temporal: stream.len(),
                });
            }
        }

        let fs = channel.sample_rate_hz;
        let order = self.params.filter_order;

        let mut highpass = ButterworthFilter::highpass(order, self.params.highpass_cutoff_hz, fs)?;
        let mut lowpass = ButterworthFilter::lowpass(order, self.params.lowpass_cutoff_hz, fs)?;

        let filtered = highpass.process(samples);
        let rectified: Vec<f32> = filtered.iter().map(|x| x.abs()).collect();
        let smoothed = lowpass.process(&rectified);

        let window = window_samples(self.params.envelope_window_ms, fs);
        let envelope = moving_rms(&smoothed, window);

        debug!(
            channel = %channel.label,
            samples = samples.len(),
            window,
            has_temporal = activated.is_some(),
            "conditioned channel"
        );

        Ok(ConditionedSignal {
            envelope,
            temporal: activated.map(|s| s.to_vec()),
        })
    }
}

fn window_samples(window_ms: f32, sample_rate_hz: f32) -> usize {
    ((window_ms / 1000.0 * sample_rate_hz).round() as usize).max(1)
}

/// Trailing moving RMS with partial windows at the start
///
/// Output has the same length as the input.
fn moving_rms(signal: &[f32], window: usize) -> Vec<f32> {
    let mut output = Vec::with_capacity(signal.len());
    let mut sum_sq = 0.0f32;

    for i in 0..signal.len() {
        sum_sq += signal[i] * signal[i];
        if i >= window {
            sum_sq -= signal[i - window] * signal[i - window];
        }
        let len = (i + 1).min(window);
        // running subtraction can drift slightly negative
        output.push((sum_sq.max(0.0) / len as f32).sqrt());
    }

    output
}
