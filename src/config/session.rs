// src/config/session.rs
//! Session-protocol parameters and the override cascade
//!
//! The original system resolved weights "from session, then database, then
//! hardcoded fallback" in several places. Here that cascade is one explicit
//! merge: [`SessionOverrides::resolve`] folds sparse overrides onto a base
//! [`SessionParameters`] value, and the pipeline only ever sees the resolved
//! result.

use serde::{Deserialize, Serialize};

use crate::config::constants::scoring;

/// Top-level weights of the composite performance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the BFR-gated compliance sub-score
    pub compliance: f32,
    /// Weight of the left/right symmetry sub-score
    pub symmetry: f32,
    /// Weight of the perceived-effort sub-score
    pub effort: f32,
    /// Weight of the game-performance sub-score
    pub game: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            compliance: scoring::DEFAULT_COMPLIANCE_WEIGHT,
            symmetry: scoring::DEFAULT_SYMMETRY_WEIGHT,
            effort: scoring::DEFAULT_EFFORT_WEIGHT,
            game: scoring::DEFAULT_GAME_WEIGHT,
        }
    }
}

impl ScoringWeights {
    /// Sum of the four weights
    pub fn sum(&self) -> f32 {
        self.compliance + self.symmetry + self.effort + self.game
    }
}

/// Sub-weights of the per-muscle compliance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceWeights {
    /// Weight of the completed-vs-target rate
    pub completion: f32,
    /// Weight of the intensity-quality rate
    pub intensity: f32,
    /// Weight of the duration-quality rate
    pub duration: f32,
}

impl Default for ComplianceWeights {
    fn default() -> Self {
        Self {
            completion: scoring::DEFAULT_COMPLETION_WEIGHT,
            intensity: scoring::DEFAULT_INTENSITY_WEIGHT,
            duration: scoring::DEFAULT_DURATION_WEIGHT,
        }
    }
}

impl ComplianceWeights {
    /// Sum of the three sub-weights
    pub fn sum(&self) -> f32 {
        self.completion + self.intensity + self.duration
    }
}

/// Game score inputs reported by the therapy game, if one was played
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamePoints {
    /// Points the patient achieved
    pub achieved: f32,
    /// Maximum achievable points
    pub max: f32,
}

/// Per-muscle overrides carried in session metadata
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelOverrides {
    /// MVC measured earlier in this session's protocol
    pub mvc_value: Option<f32>,
    /// MVC carried over from patient history
    pub mvc_history_value: Option<f32>,
    /// Muscle-specific hold-time requirement, ms
    pub duration_threshold_ms: Option<f32>,
}

/// Resolved session-protocol parameters for one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParameters {
    /// Expected contraction count per muscle
    pub target_contractions: u32,
    /// Applied cuff pressure as percent of arterial occlusion pressure
    pub bfr_pressure_percent: Option<f32>,
    /// Post-session Borg CR10 effort rating, 0-10
    pub effort_rating: Option<u8>,
    /// Game points, absent when no game was played
    pub game_points: Option<GamePoints>,
    /// Top-level score weights
    pub weights: ScoringWeights,
    /// Compliance sub-score weights
    pub compliance_weights: ComplianceWeights,
    /// Left-muscle overrides
    pub left: ChannelOverrides,
    /// Right-muscle overrides
    pub right: ChannelOverrides,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            target_contractions: scoring::DEFAULT_TARGET_CONTRACTIONS,
            bfr_pressure_percent: None,
            effort_rating: None,
            game_points: None,
            weights: ScoringWeights::default(),
            compliance_weights: ComplianceWeights::default(),
            left: ChannelOverrides::default(),
            right: ChannelOverrides::default(),
        }
    }
}

impl SessionParameters {
    /// Parse session parameters from a TOML document
    pub fn from_toml_str(doc: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(doc)
    }
}

/// Sparse session overrides, typically deserialized from a session record
///
/// Only `Some` fields replace the base value; everything else falls through
/// to the base (profile or compiled default).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOverrides {
    /// Override for the expected contraction count
    pub target_contractions: Option<u32>,
    /// Override for the applied BFR pressure, percent of AOP
    pub bfr_pressure_percent: Option<f32>,
    /// Override for the effort rating
    pub effort_rating: Option<u8>,
    /// Override for the game points
    pub game_points: Option<GamePoints>,
    /// Override for the top-level weights (all-or-nothing)
    pub weights: Option<ScoringWeights>,
    /// Override for the compliance sub-weights (all-or-nothing)
    pub compliance_weights: Option<ComplianceWeights>,
    /// Left-muscle overrides
    pub left: ChannelOverrides,
    /// Right-muscle overrides
    pub right: ChannelOverrides,
}

impl SessionOverrides {
    /// Fold these overrides onto a base parameter set
    pub fn resolve(&self, base: &SessionParameters) -> SessionParameters {
        SessionParameters {
            target_contractions: self.target_contractions.unwrap_or(base.target_contractions),
            bfr_pressure_percent: self.bfr_pressure_percent.or(base.bfr_pressure_percent),
            effort_rating: self.effort_rating.or(base.effort_rating),
            game_points: self.game_points.or(base.game_points),
            weights: self.weights.unwrap_or(base.weights),
            compliance_weights: self.compliance_weights.unwrap_or(base.compliance_weights),
            left: merge_channel(&self.left, &base.left),
            right: merge_channel(&self.right, &base.right),
        }
    }
}

fn merge_channel(over: &ChannelOverrides, base: &ChannelOverrides) -> ChannelOverrides {
    ChannelOverrides {
        mvc_value: over.mvc_value.or(base.mvc_value),
        mvc_history_value: over.mvc_history_value.or(base.mvc_history_value),
        duration_threshold_ms: over.duration_threshold_ms.or(base.duration_threshold_ms),
    }
}
