// src/config/constants.rs
//! System-wide configuration defaults
//!
//! Every numeric default of the pipeline lives here so the processing code
//! carries no magic numbers. All values are overridable through
//! [`ProcessingParameters`](crate::config::parameters::ProcessingParameters)
//! and [`SessionParameters`](crate::config::session::SessionParameters).

/// Signal conditioning constants
pub mod conditioning {
    /// High-pass cutoff removing DC offset and motion artifact
    pub const HIGHPASS_CUTOFF_HZ: f32 = 20.0;
    /// Low-pass cutoff smoothing the rectified signal into an envelope
    pub const LOWPASS_CUTOFF_HZ: f32 = 10.0;
    /// Butterworth filter order for both stages
    pub const FILTER_ORDER: usize = 4;
    /// Moving-RMS smoothing window for the final envelope
    pub const ENVELOPE_WINDOW_MS: f32 = 50.0;
    /// Envelope window overlap
    pub const ENVELOPE_OVERLAP_PERCENT: f32 = 50.0;
    /// Minimum sample count for a channel to be conditioned at all
    pub const MIN_SAMPLE_COUNT: usize = 1000;
    /// Below this variance a signal is considered flat (dead electrode)
    pub const FLAT_SIGNAL_VARIANCE: f32 = 1e-10;
}

/// MVC calibration constants
pub mod mvc {
    /// Percentile of the session envelope used as the self-calibrated MVC
    pub const SELF_CALIBRATION_PERCENTILE: f32 = 95.0;
    /// Confidence assigned to an MVC taken from session metadata
    pub const METADATA_CONFIDENCE: f32 = 1.0;
    /// Confidence assigned to an MVC taken from patient history
    pub const HISTORY_CONFIDENCE: f32 = 0.8;
    /// Fraction of the calibrated peak used when probing contraction
    /// durations for the consistency heuristic
    pub const DURATION_PROBE_FACTOR: f32 = 0.5;
    /// Peak-to-RMS ratio that earns full prominence credit
    pub const FULL_PROMINENCE_RATIO: f32 = 3.0;
}

/// Contraction detection constants
pub mod detection {
    /// Threshold factor when a dedicated temporal stream is available
    pub const TEMPORAL_THRESHOLD_FACTOR: f32 = 0.05;
    /// Threshold factor when the envelope is reused for timing
    pub const ENVELOPE_THRESHOLD_FACTOR: f32 = 0.10;
    /// Historical alternate envelope factor; selectable, never the default
    pub const LEGACY_ENVELOPE_THRESHOLD_FACTOR: f32 = 0.30;
    /// Candidates shorter than this are discarded as noise
    pub const MIN_DURATION_MS: f32 = 100.0;
    /// Candidates closer than this are one physiological contraction
    pub const MERGE_THRESHOLD_MS: f32 = 150.0;
    /// Rising edges inside this window after an interval end are absorbed
    pub const REFRACTORY_PERIOD_MS: f32 = 50.0;
    /// Percent of MVC a contraction must reach to count as intense enough
    pub const MVC_THRESHOLD_PERCENT: f32 = 75.0;
    /// Minimum hold time for a contraction to count as long enough
    pub const DURATION_THRESHOLD_MS: f32 = 2000.0;
}

/// Spectral analysis constants
pub mod spectral {
    /// Minimum sample count for any frequency-domain estimate
    pub const MIN_SAMPLE_COUNT: usize = 256;
    /// Welch segment length cap
    pub const MAX_SEGMENT_LEN: usize = 256;
    /// Welch segment length is also capped at N divided by this
    pub const SEGMENT_DIVISOR: usize = 4;
    /// Welch segment overlap
    pub const SEGMENT_OVERLAP: f32 = 0.5;
    /// Below this variance the spectrum is meaningless
    pub const FLAT_SIGNAL_VARIANCE: f32 = 1e-10;
}

/// Temporal aggregation constants
pub mod temporal {
    /// Aggregation window length
    pub const WINDOW_MS: f32 = 1000.0;
    /// Aggregation window overlap
    pub const OVERLAP_PERCENT: f32 = 50.0;
    /// Fewer valid windows than this yields all-absent statistics
    pub const MIN_WINDOWS_REQUIRED: usize = 3;
}

/// Performance scoring constants
pub mod scoring {
    /// Expected contractions per session under the clinical protocol
    pub const DEFAULT_TARGET_CONTRACTIONS: u32 = 12;
    /// Lower bound of the safe BFR pressure band, percent of AOP
    pub const BFR_MIN_PERCENT_AOP: f32 = 45.0;
    /// Upper bound of the safe BFR pressure band, percent of AOP
    pub const BFR_MAX_PERCENT_AOP: f32 = 55.0;
    /// Weight groups must sum to 1.0 within this tolerance
    pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-6;

    /// Default top-level score weights
    pub const DEFAULT_COMPLIANCE_WEIGHT: f32 = 0.50;
    pub const DEFAULT_SYMMETRY_WEIGHT: f32 = 0.25;
    pub const DEFAULT_EFFORT_WEIGHT: f32 = 0.25;
    pub const DEFAULT_GAME_WEIGHT: f32 = 0.00;

    /// Default compliance sub-score weights
    pub const DEFAULT_COMPLETION_WEIGHT: f32 = 0.40;
    pub const DEFAULT_INTENSITY_WEIGHT: f32 = 0.30;
    pub const DEFAULT_DURATION_WEIGHT: f32 = 0.30;
}
