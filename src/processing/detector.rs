// src/processing/detector.rs
//! Contraction detection over the timing stream
//!
//! A threshold state machine finds candidate intervals on the timing stream
//! (the dedicated temporal stream when present, the envelope otherwise),
//! then three passes clean them up: sub-100 ms candidates are dropped,
//! candidates separated by at most the merge threshold collapse into one
//! physiological contraction, and rising edges inside the refractory window
//! after an interval end are absorbed as continuations. Amplitude and the
//! intensity flag are always read from the envelope, never the timing
//! stream.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::parameters::{DetectorParams, ParameterError};
use crate::processing::conditioner::ConditionedSignal;
use crate::processing::mvc::MvcEstimate;

/// One detected muscle contraction
///
/// Intervals are non-overlapping and sorted by start time; `end_index` is an
/// exclusive sample offset, so `envelope[start_index..end_index]` is the
/// contraction's amplitude range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contraction {
    /// First sample of the interval
    pub start_index: usize,
    /// One past the last sample of the interval
    pub end_index: usize,
    /// Interval start in milliseconds from recording start
    pub start_time_ms: f32,
    /// Interval end in milliseconds from recording start
    pub end_time_ms: f32,
    /// Interval length in milliseconds
    pub duration_ms: f32,
    /// Peak envelope amplitude inside the interval
    pub max_amplitude: f32,
    /// Peak reached the configured percentage of MVC
    pub meets_intensity: bool,
    /// Hold time reached the configured duration threshold
    pub meets_duration: bool,
    /// Both quality criteria met
    pub is_good: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize, // exclusive
}

/// Contraction detector for one parameter set
pub struct ContractionDetector {
    params: DetectorParams,
}

impl ContractionDetector {
    /// Create a detector with the given parameters
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    /// Detect contractions in one conditioned channel
    ///
    /// Degenerate inputs (empty stream, flat stream, threshold at or above
    /// the stream maximum) yield an empty list, not an error.
    pub fn detect(
        &self,
        conditioned: &ConditionedSignal,
        sample_rate_hz: f32,
        mvc: &MvcEstimate,
    ) -> Result<Vec<Contraction>, ParameterError> {
        self.params.validate()?;

        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            warn!(sample_rate_hz, "unusable sample rate, no contractions");
            return Ok(Vec::new());
        }

        let timing = conditioned.timing_stream();
        let factor = if conditioned.has_temporal() {
            self.params.temporal_threshold_factor
        } else {
            self.params.threshold_profile.envelope_factor()
        };

        let peak = timing.iter().cloned().fold(f32::MIN, f32::max);
        if timing.is_empty() || !peak.is_finite() || peak <= 0.0 {
            return Ok(Vec::new());
        }

        let threshold = factor * peak;
        if threshold >= peak {
            return Ok(Vec::new());
        }

        let ms_per_sample = 1000.0 / sample_rate_hz;

        let candidates = scan_edges(timing, threshold);
        let candidates = self.drop_short(candidates, ms_per_sample);
        let candidates = merge_within(candidates, self.params.merge_threshold_ms, ms_per_sample, false);
        let candidates = merge_within(
            candidates,
            self.params.refractory_period_ms,
            ms_per_sample,
            true,
        );

        let contractions: Vec<Contraction> = candidates
            .into_iter()
            .map(|c| self.build_contraction(c, &conditioned.envelope, ms_per_sample, mvc))
            .collect();

        debug!(
            count = contractions.len(),
            threshold,
            dedicated_temporal = conditioned.has_temporal(),
            "detected contractions"
        );

        Ok(contractions)
    }

    fn drop_short(&self, candidates: Vec<Candidate>, ms_per_sample: f32) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|c| (c.end - c.start) as f32 * ms_per_sample >= self.params.min_duration_ms)
            .collect()
    }

    fn build_contraction(
        &self,
        candidate: Candidate,
        envelope: &[f32],
        ms_per_sample: f32,
        mvc: &MvcEstimate,
    ) -> Contraction {
        let start = candidate.start;
        let end = candidate.end;

        let max_amplitude = envelope
            .get(start..end.min(envelope.len()))
            .unwrap_or(&[])
            .iter()
            .cloned()
            .fold(0.0f32, f32::max);

        let duration_ms = (end - start) as f32 * ms_per_sample;

        // no MVC reference means intensity cannot be certified
        let meets_intensity = mvc.value > 0.0
            && max_amplitude >= self.params.mvc_threshold_percent / 100.0 * mvc.value;
        let meets_duration = duration_ms >= self.params.duration_threshold_ms;

        Contraction {
            start_index: start,
            end_index: end,
            start_time_ms: start as f32 * ms_per_sample,
            end_time_ms: end as f32 * ms_per_sample,
            duration_ms,
            max_amplitude,
            meets_intensity,
            meets_duration,
            is_good: meets_intensity && meets_duration,
        }
    }
}

/// Rising/falling edge scan; a run still open at end-of-signal closes there
fn scan_edges(timing: &[f32], threshold: f32) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut open: Option<usize> = None;

    for (i, &x) in timing.iter().enumerate() {
        match (open, x > threshold) {
            (None, true) => open = Some(i),
            (Some(start), false) => {
                candidates.push(Candidate { start, end: i });
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        candidates.push(Candidate {
            start,
            end: timing.len(),
        });
    }

    candidates
}

/// Collapse neighbors whose gap is within `threshold_ms`
///
/// `strict` uses `<` (refractory absorption); otherwise `<=` (merge).
fn merge_within(
    candidates: Vec<Candidate>,
    threshold_ms: f32,
    ms_per_sample: f32,
    strict: bool,
) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if let Some(last) = merged.last_mut() {
            let gap_ms = (candidate.start - last.end) as f32 * ms_per_sample;
            let within = if strict {
                gap_ms < threshold_ms
            } else {
                gap_ms <= threshold_ms
            };
            if within {
                last.end = candidate.end;
                continue;
            }
        }
        merged.push(candidate);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mvc::MvcSource;

    fn mvc(value: f32) -> MvcEstimate {
        MvcEstimate {
            value,
            source: MvcSource::Metadata,
            confidence: 1.0,
        }
    }

    fn envelope_signal(segments: &[(usize, f32)]) -> ConditionedSignal {
        let mut envelope = Vec::new();
        for &(len, level) in segments {
            envelope.extend(std::iter::repeat(level).take(len));
        }
        ConditionedSignal {
            envelope,
            temporal: None,
        }
    }

    // 1 kHz makes one sample one millisecond
    const FS: f32 = 1000.0;

    #[test]
    fn test_single_clean_pulse_is_good() {
        // amplitude 80 for 2500 ms, MVC 100, thresholds 75% / 2000 ms
        let signal = envelope_signal(&[(500, 0.0), (2500, 80.0), (500, 0.0)]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();

        assert_eq!(contractions.len(), 1);
        let c = &contractions[0];
        assert_eq!(c.start_index, 500);
        assert_eq!(c.end_index, 3000);
        assert_eq!(c.duration_ms, 2500.0);
        assert_eq!(c.max_amplitude, 80.0);
        assert!(c.meets_intensity);
        assert!(c.meets_duration);
        assert!(c.is_good);
    }

    #[test]
    fn test_gap_within_merge_threshold_collapses() {
        // two 120 ms pulses, 100 ms apart: one merged contraction
        let signal = envelope_signal(&[
            (500, 0.0),
            (120, 50.0),
            (100, 0.0),
            (120, 50.0),
            (500, 0.0),
        ]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();

        assert_eq!(contractions.len(), 1);
        assert_eq!(contractions[0].start_index, 500);
        assert_eq!(contractions[0].end_index, 840);
        assert_eq!(contractions[0].duration_ms, 340.0);
    }

    #[test]
    fn test_gap_beyond_merge_threshold_stays_distinct() {
        let signal = envelope_signal(&[
            (500, 0.0),
            (120, 50.0),
            (200, 0.0),
            (120, 50.0),
            (500, 0.0),
        ]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();
        assert_eq!(contractions.len(), 2);
        assert!(contractions[0].end_time_ms < contractions[1].start_time_ms);
    }

    #[test]
    fn test_refractory_absorbs_close_rising_edge() {
        // merge threshold tightened below the gap so only the refractory
        // pass can join the two candidates
        let params = DetectorParams {
            merge_threshold_ms: 10.0,
            ..Default::default()
        };
        let signal = envelope_signal(&[
            (500, 0.0),
            (120, 50.0),
            (30, 0.0),
            (120, 50.0),
            (500, 0.0),
        ]);
        let detector = ContractionDetector::new(params);
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();
        assert_eq!(contractions.len(), 1);
        assert_eq!(contractions[0].end_index, 770);
    }

    #[test]
    fn test_short_candidates_dropped() {
        let signal = envelope_signal(&[(500, 0.0), (50, 50.0), (500, 0.0)]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();
        assert!(contractions.is_empty());
    }

    #[test]
    fn test_candidate_open_at_end_of_signal() {
        let signal = envelope_signal(&[(500, 0.0), (300, 50.0)]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();
        assert_eq!(contractions.len(), 1);
        assert_eq!(contractions[0].end_index, 800);
    }

    #[test]
    fn test_degenerate_inputs_yield_empty_list() {
        let detector = ContractionDetector::new(DetectorParams::default());

        let empty = ConditionedSignal {
            envelope: Vec::new(),
            temporal: None,
        };
        assert!(detector.detect(&empty, FS, &mvc(100.0)).unwrap().is_empty());

        let flat = envelope_signal(&[(1000, 0.0)]);
        assert!(detector.detect(&flat, FS, &mvc(100.0)).unwrap().is_empty());

        let signal = envelope_signal(&[(500, 0.0), (300, 50.0), (500, 0.0)]);
        assert!(detector.detect(&signal, 0.0, &mvc(100.0)).unwrap().is_empty());
    }

    #[test]
    fn test_temporal_stream_drives_timing_envelope_drives_amplitude() {
        // timing says 400-700, envelope peaks at 90 inside that range
        let mut temporal = vec![0.0f32; 1200];
        for x in &mut temporal[400..700] {
            *x = 1.0;
        }
        let mut envelope = vec![5.0f32; 1200];
        envelope[550] = 90.0;
        let signal = ConditionedSignal {
            envelope,
            temporal: Some(temporal),
        };

        let params = DetectorParams {
            duration_threshold_ms: 200.0,
            ..Default::default()
        };
        let detector = ContractionDetector::new(params);
        let contractions = detector.detect(&signal, FS, &mvc(100.0)).unwrap();

        assert_eq!(contractions.len(), 1);
        let c = &contractions[0];
        assert_eq!(c.start_index, 400);
        assert_eq!(c.end_index, 700);
        assert_eq!(c.max_amplitude, 90.0);
        assert!(c.meets_intensity);
        assert!(c.is_good);
    }

    #[test]
    fn test_no_mvc_reference_fails_intensity() {
        let signal = envelope_signal(&[(500, 0.0), (2500, 80.0), (500, 0.0)]);
        let detector = ContractionDetector::new(DetectorParams::default());
        let contractions = detector.detect(&signal, FS, &mvc(0.0)).unwrap();
        assert_eq!(contractions.len(), 1);
        assert!(!contractions[0].meets_intensity);
        assert!(contractions[0].meets_duration);
        assert!(!contractions[0].is_good);
    }

    #[test]
    fn test_legacy_profile_uses_higher_threshold() {
        use crate::config::parameters::ThresholdProfile;
        // plateau at 20 percent of peak: visible at 10%, invisible at 30%
        let signal = envelope_signal(&[
            (500, 0.0),
            (300, 20.0),
            (300, 0.0),
            (200, 100.0),
            (500, 0.0),
        ]);

        let standard = ContractionDetector::new(DetectorParams {
            duration_threshold_ms: 100.0,
            ..Default::default()
        });
        assert_eq!(standard.detect(&signal, FS, &mvc(100.0)).unwrap().len(), 2);

        let legacy = ContractionDetector::new(DetectorParams {
            duration_threshold_ms: 100.0,
            threshold_profile: ThresholdProfile::Legacy,
            ..Default::default()
        });
        assert_eq!(legacy.detect(&signal, FS, &mvc(100.0)).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_mvc_threshold_is_hard_error() {
        let params = DetectorParams {
            mvc_threshold_percent: 0.0,
            ..Default::default()
        };
        let detector = ContractionDetector::new(params);
        let signal = envelope_signal(&[(1000, 1.0)]);
        assert!(detector.detect(&signal, FS, &mvc(100.0)).is_err());
    }
}
