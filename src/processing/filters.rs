// src/processing/filters.rs
//! IIR Butterworth filters for the conditioning chain
//!
//! Even-order Butterworth responses built as cascades of second-order
//! sections. Section Q values come from the Butterworth pole angles, so a
//! 4th-order filter is two biquads with Q = 0.5412 and Q = 1.3066.

use std::f32::consts::PI;
use thiserror::Error;

/// Filter design errors
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    /// Order outside the supported even 2-8 range
    #[error("unsupported filter order {0}: must be even, 2-8")]
    InvalidOrder(usize),

    /// Cutoff at or beyond Nyquist, or non-positive
    #[error("invalid cutoff {cutoff_hz} Hz for sample rate {sample_rate_hz} Hz")]
    InvalidCutoff { cutoff_hz: f32, sample_rate_hz: f32 },
}

/// Filter pass band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandType {
    /// Attenuate above the cutoff
    Lowpass,
    /// Attenuate below the cutoff
    Highpass,
}

/// One second-order section in transposed direct form II
#[derive(Debug, Clone)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// Design a single section at the given cutoff and Q
    fn design(band: BandType, cutoff: f32, sample_rate: f32, q: f32) -> Self {
        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q);

        let (b0, b1, b2) = match band {
            BandType::Lowpass => {
                let b1 = 1.0 - cos_w;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            BandType::Highpass => {
                let b1 = -(1.0 + cos_w);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };

        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Even-order Butterworth filter as a cascade of biquad sections
pub struct ButterworthFilter {
    sections: Vec<Biquad>,
    order: usize,
}

impl ButterworthFilter {
    /// Design an even-order Butterworth filter
    pub fn new(
        band: BandType,
        order: usize,
        cutoff_hz: f32,
        sample_rate_hz: f32,
    ) -> Result<Self, FilterError> {
        if order == 0 || order > 8 || order % 2 != 0 {
            return Err(FilterError::InvalidOrder(order));
        }
        if cutoff_hz <= 0.0 || cutoff_hz >= sample_rate_hz / 2.0 || !sample_rate_hz.is_finite() {
            return Err(FilterError::InvalidCutoff {
                cutoff_hz,
                sample_rate_hz,
            });
        }

        // Butterworth pole pair k has Q = 1 / (2 sin theta_k),
        // theta_k = (2k + 1) * pi / (2n)
        let n = order as f32;
        let sections = (0..order / 2)
            .map(|k| {
                let theta = (2.0 * k as f32 + 1.0) * PI / (2.0 * n);
                let q = 1.0 / (2.0 * theta.sin());
                Biquad::design(band, cutoff_hz, sample_rate_hz, q)
            })
            .collect();

        Ok(Self { sections, order })
    }

    /// Convenience constructor for a low-pass design
    pub fn lowpass(order: usize, cutoff_hz: f32, sample_rate_hz: f32) -> Result<Self, FilterError> {
        Self::new(BandType::Lowpass, order, cutoff_hz, sample_rate_hz)
    }

    /// Convenience constructor for a high-pass design
    pub fn highpass(
        order: usize,
        cutoff_hz: f32,
        sample_rate_hz: f32,
    ) -> Result<Self, FilterError> {
        Self::new(BandType::Highpass, order, cutoff_hz, sample_rate_hz)
    }

    /// Process a single sample through the cascade
    pub fn process_sample(&mut self, input: f32) -> f32 {
        self.sections
            .iter_mut()
            .fold(input, |x, section| section.process_sample(x))
    }

    /// Filter a whole signal, producing a new buffer of the same length
    pub fn process(&mut self, signal: &[f32]) -> Vec<f32> {
        signal.iter().map(|&x| self.process_sample(x)).collect()
    }

    /// Clear all section state
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    /// Get filter order
    pub fn order(&self) -> usize {
        self.order
    }
}
