// src/processing/spectral.rs
//! Frequency-domain fatigue descriptors
//!
//! Welch's method over the raw, unfiltered signal: the conditioning chain
//! removes exactly the frequency content these estimates need. Mean and
//! median power frequency drop as a muscle fatigues; the normalized-moment
//! fatigue index (Dimitrov's M-1/M5 ratio) rises.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::spectral;
use crate::config::parameters::SpectralParams;
use crate::types::variance;

/// Frequency-domain summary for one signal stretch
///
/// All fields are absent when the input is too short or too flat to
/// estimate a spectrum; absence is explicit so consumers can tell
/// "computed as zero" from "could not be computed".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralSummary {
    /// Power-weighted mean frequency, Hz
    pub mean_power_frequency: Option<f32>,
    /// Frequency splitting total power in half, Hz
    pub median_frequency: Option<f32>,
    /// Dimitrov fatigue index M(-1)/M(5)
    pub fatigue_index: Option<f32>,
}

impl SpectralSummary {
    /// Summary with every field absent
    pub fn absent() -> Self {
        Self::default()
    }

    /// True when no field could be computed
    pub fn is_absent(&self) -> bool {
        self.mean_power_frequency.is_none()
            && self.median_frequency.is_none()
            && self.fatigue_index.is_none()
    }
}

/// Welch-method spectral analyzer
pub struct SpectralAnalyzer {
    params: SpectralParams,
}

impl SpectralAnalyzer {
    /// Create an analyzer with the given parameters
    pub fn new(params: SpectralParams) -> Self {
        Self { params }
    }

    /// Compute the spectral summary of a raw signal stretch
    pub fn analyze(&self, samples: &[f32], sample_rate_hz: f32) -> SpectralSummary {
        if samples.len() < self.params.min_sample_count {
            debug!(
                got = samples.len(),
                required = self.params.min_sample_count,
                "too few samples for spectral estimate"
            );
            return SpectralSummary::absent();
        }
        if variance(samples) <= self.params.flat_variance_threshold {
            debug!("flat signal, skipping spectral estimate");
            return SpectralSummary::absent();
        }
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return SpectralSummary::absent();
        }

        let (freqs, psd) = match self.welch_psd(samples, sample_rate_hz) {
            Some(result) => result,
            None => return SpectralSummary::absent(),
        };

        let total_power: f32 = psd.iter().sum();
        if total_power <= 0.0 || !total_power.is_finite() {
            return SpectralSummary::absent();
        }

        SpectralSummary {
            mean_power_frequency: Some(mean_power_frequency(&freqs, &psd, total_power)),
            median_frequency: Some(median_frequency(&freqs, &psd, total_power)),
            fatigue_index: fatigue_index(&freqs, &psd),
        }
    }

    /// One-sided Welch PSD: Hann window, per-segment mean detrend,
    /// 50% overlap, averaged periodograms
    fn welch_psd(&self, samples: &[f32], sample_rate_hz: f32) -> Option<(Vec<f32>, Vec<f32>)> {
        let n = samples.len();
        let seg_len = self
            .params
            .max_segment_len
            .min(n / spectral::SEGMENT_DIVISOR)
            .max(8);
        let hop = (((1.0 - self.params.segment_overlap) * seg_len as f32) as usize).max(1);

        let window: Vec<f32> = (0..seg_len)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (seg_len - 1) as f32).cos())
            })
            .collect();
        let window_power: f32 = window.iter().map(|w| w * w).sum();

        let fft = FftPlanner::<f32>::new().plan_fft_forward(seg_len);
        let bins = seg_len / 2 + 1;
        let mut accumulated = vec![0.0f32; bins];
        let mut segments = 0usize;
        let mut buffer = vec![Complex::new(0.0f32, 0.0f32); seg_len];

        let mut start = 0;
        while start + seg_len <= n {
            let segment = &samples[start..start + seg_len];
            let segment_mean = segment.iter().sum::<f32>() / seg_len as f32;

            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new((segment[i] - segment_mean) * window[i], 0.0);
            }
            fft.process(&mut buffer);

            for (k, slot) in accumulated.iter_mut().enumerate() {
                *slot += buffer[k].norm_sqr();
            }
            segments += 1;
            start += hop;
        }

        if segments == 0 {
            return None;
        }

        let scale = 1.0 / (sample_rate_hz * window_power * segments as f32);
        let psd: Vec<f32> = accumulated
            .iter()
            .enumerate()
            .map(|(k, &acc)| {
                // one-sided: double everything except DC and Nyquist
                let fold = if k == 0 || k == bins - 1 { 1.0 } else { 2.0 };
                acc * scale * fold
            })
            .collect();
        let freqs: Vec<f32> = (0..bins)
            .map(|k| k as f32 * sample_rate_hz / seg_len as f32)
            .collect();

        Some((freqs, psd))
    }
}

fn mean_power_frequency(freqs: &[f32], psd: &[f32], total_power: f32) -> f32 {
    let weighted: f32 = freqs.iter().zip(psd).map(|(&f, &p)| f * p).sum();
    weighted / total_power
}

fn median_frequency(freqs: &[f32], psd: &[f32], total_power: f32) -> f32 {
    let half_power = total_power / 2.0;
    let mut cumulative = 0.0f32;
    for (&f, &p) in freqs.iter().zip(psd) {
        cumulative += p;
        if cumulative >= half_power {
            return f;
        }
    }
    // unreachable with positive total power
    *freqs.last().unwrap_or(&0.0)
}

/// Dimitrov spectral moment ratio M(-1)/M(5), restricted to f > 0
fn fatigue_index(freqs: &[f32], psd: &[f32]) -> Option<f32> {
    let mut m_neg1 = 0.0f32;
    let mut m_5 = 0.0f32;
    for (&f, &p) in freqs.iter().zip(psd) {
        if f <= 0.0 {
            continue;
        }
        m_neg1 += p / f;
        m_5 += p * f.powi(5);
    }
    if m_5 == 0.0 {
        return None;
    }
    Some(m_neg1 / m_5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, n: usize, fs: f32) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / fs).sin())
            .collect()
    }

    #[test]
    fn test_sine_peak_located() {
        let analyzer = SpectralAnalyzer::new(SpectralParams::default());
        let summary = analyzer.analyze(&sine(100.0, 1024, 1000.0), 1000.0);

        let mpf = summary.mean_power_frequency.unwrap();
        let mdf = summary.median_frequency.unwrap();
        assert!((mpf - 100.0).abs() < 10.0, "mpf {mpf}");
        assert!((mdf - 100.0).abs() < 5.0, "mdf {mdf}");
        assert!(summary.fatigue_index.is_some());
    }

    #[test]
    fn test_fatigue_shift_lowers_median_frequency() {
        let analyzer = SpectralAnalyzer::new(SpectralParams::default());
        let fresh = analyzer.analyze(&sine(120.0, 2048, 1000.0), 1000.0);
        let tired = analyzer.analyze(&sine(60.0, 2048, 1000.0), 1000.0);

        assert!(tired.median_frequency.unwrap() < fresh.median_frequency.unwrap());
        // low-frequency shift inflates the Dimitrov index
        assert!(tired.fatigue_index.unwrap() > fresh.fatigue_index.unwrap());
    }

    #[test]
    fn test_short_input_absent() {
        let analyzer = SpectralAnalyzer::new(SpectralParams::default());
        let summary = analyzer.analyze(&sine(100.0, 255, 1000.0), 1000.0);
        assert!(summary.is_absent());
    }

    #[test]
    fn test_flat_input_absent() {
        let analyzer = SpectralAnalyzer::new(SpectralParams::default());
        assert!(analyzer.analyze(&[1.0; 2048], 1000.0).is_absent());
        assert!(analyzer.analyze(&[0.0; 2048], 1000.0).is_absent());
    }

    #[test]
    fn test_segment_length_follows_input() {
        // N/4 < 256 forces shorter segments but still yields estimates
        let analyzer = SpectralAnalyzer::new(SpectralParams::default());
        let summary = analyzer.analyze(&sine(100.0, 300, 1000.0), 1000.0);
        assert!(summary.mean_power_frequency.is_some());
    }
}
