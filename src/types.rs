// src/types.rs
//! Shared input data model

use serde::{Deserialize, Serialize};

/// One raw EMG voltage channel as delivered by the recording parser
///
/// The core never mutates a `RawChannel`; every pipeline stage borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChannel {
    /// Raw voltage samples
    pub samples: Vec<f32>,
    /// Shared sampling rate in Hz
    pub sample_rate_hz: f32,
    /// Channel label, e.g. `"vastus_medialis_left"`
    pub label: String,
}

impl RawChannel {
    /// Create a channel from samples and a sampling rate
    pub fn new(samples: Vec<f32>, sample_rate_hz: f32, label: impl Into<String>) -> Self {
        Self {
            samples,
            sample_rate_hz,
            label: label.into(),
        }
    }

    /// Recording length in milliseconds
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate_hz <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f32 * 1000.0 / self.sample_rate_hz
    }

    /// Population variance of the raw samples
    pub fn variance(&self) -> f32 {
        variance(&self.samples)
    }
}

/// Population variance of a sample slice, 0.0 for empty input
pub(crate) fn variance(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    data.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / data.len() as f32
}
