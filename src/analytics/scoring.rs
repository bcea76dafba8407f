// src/analytics/scoring.rs
//! Composite therapeutic performance score
//!
//! Combines both muscle reports with the session protocol into one 0-100
//! score. Compliance is gated by BFR pressure safety: outside the
//! prescribed 45-55% AOP band the whole compliance term is zeroed, a hard
//! cutoff rather than a graded penalty.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analytics::channel::ChannelAnalytics;
use crate::config::constants::scoring;
use crate::config::session::{ComplianceWeights, GamePoints, SessionParameters};

/// Session scoring failures, always hard
///
/// A partial score that silently omits a required factor is worse than no
/// score, so nothing here degrades gracefully.
#[derive(Debug, Clone, Error)]
pub enum ScoringError {
    /// A weight group does not sum to 1.0
    #[error("{group} weights sum to {sum}, expected 1.0")]
    InvalidWeights { group: &'static str, sum: f32 },

    /// The expected-contraction target is zero
    #[error("target contraction count must be positive")]
    InvalidTarget,

    /// A channel report required for scoring is missing
    #[error("missing {side} channel analytics")]
    MissingChannel { side: &'static str },
}

/// Per-muscle compliance breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuscleCompliance {
    /// completed / target, capped at 1.0
    pub completion_rate: f32,
    /// intensity-passing contractions / completed
    pub intensity_rate: f32,
    /// duration-passing contractions / completed
    pub duration_rate: f32,
    /// Weighted compliance on the 0-100 scale
    pub compliance_percent: f32,
}

/// Composite session score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    /// Weighted overall score, 0-100
    pub overall: f32,
    /// BFR-gated compliance sub-score, 0-100
    pub compliance: f32,
    /// Left/right symmetry sub-score, 0-100
    pub symmetry: f32,
    /// Perceived-effort sub-score, 0-100
    pub effort: f32,
    /// Game-performance sub-score, 0-100
    pub game: f32,
    /// Whether the applied BFR pressure was inside the safe band
    pub bfr_safety_gate: bool,
    /// Left-muscle compliance breakdown
    pub left: MuscleCompliance,
    /// Right-muscle compliance breakdown
    pub right: MuscleCompliance,
}

/// Stateless session scorer
pub struct PerformanceScorer;

impl PerformanceScorer {
    /// Score a session from both channel reports and the protocol
    pub fn score(
        left: Option<&ChannelAnalytics>,
        right: Option<&ChannelAnalytics>,
        session: &SessionParameters,
    ) -> Result<PerformanceScore, ScoringError> {
        validate_weight_sum("scoring", session.weights.sum())?;
        validate_weight_sum("compliance", session.compliance_weights.sum())?;
        if session.target_contractions == 0 {
            return Err(ScoringError::InvalidTarget);
        }

        let left = left.ok_or(ScoringError::MissingChannel { side: "left" })?;
        let right = right.ok_or(ScoringError::MissingChannel { side: "right" })?;

        let left_compliance = muscle_compliance(
            left,
            session.target_contractions,
            &session.compliance_weights,
        );
        let right_compliance = muscle_compliance(
            right,
            session.target_contractions,
            &session.compliance_weights,
        );

        let gate = bfr_gate(session.bfr_pressure_percent);
        let gate_factor = if gate { 1.0 } else { 0.0 };

        let compliance = (left_compliance.compliance_percent
            + right_compliance.compliance_percent)
            / 2.0
            * gate_factor;
        let symmetry = symmetry_score(
            left_compliance.compliance_percent,
            right_compliance.compliance_percent,
        );
        let effort = effort_score(session.effort_rating);
        let game = game_score(session.game_points);

        let w = &session.weights;
        let overall =
            w.compliance * compliance + w.symmetry * symmetry + w.effort * effort + w.game * game;

        debug!(overall, compliance, symmetry, effort, game, gate, "scored session");

        Ok(PerformanceScore {
            overall,
            compliance,
            symmetry,
            effort,
            game,
            bfr_safety_gate: gate,
            left: left_compliance,
            right: right_compliance,
        })
    }
}

fn validate_weight_sum(group: &'static str, sum: f32) -> Result<(), ScoringError> {
    if !sum.is_finite() || (sum - 1.0).abs() > scoring::WEIGHT_SUM_TOLERANCE {
        return Err(ScoringError::InvalidWeights { group, sum });
    }
    Ok(())
}

fn muscle_compliance(
    analytics: &ChannelAnalytics,
    target: u32,
    weights: &ComplianceWeights,
) -> MuscleCompliance {
    let completed = analytics.counts.total;

    let completion_rate = (completed as f32 / target as f32).min(1.0);
    let (intensity_rate, duration_rate) = if completed == 0 {
        (0.0, 0.0)
    } else {
        (
            analytics.counts.meets_intensity_total() as f32 / completed as f32,
            analytics.counts.meets_duration_total() as f32 / completed as f32,
        )
    };

    let compliance = weights.completion * completion_rate
        + weights.intensity * intensity_rate
        + weights.duration * duration_rate;

    MuscleCompliance {
        completion_rate,
        intensity_rate,
        duration_rate,
        compliance_percent: compliance * 100.0,
    }
}

/// Pressure inside [45, 55]% of arterial occlusion pressure
///
/// Unreported pressure closes the gate: a session that never measured cuff
/// pressure cannot claim BFR compliance.
fn bfr_gate(pressure_percent: Option<f32>) -> bool {
    matches!(
        pressure_percent,
        Some(p) if (scoring::BFR_MIN_PERCENT_AOP..=scoring::BFR_MAX_PERCENT_AOP).contains(&p)
    )
}

/// Symmetry of the two compliance values, 100 when both are zero
fn symmetry_score(left: f32, right: f32) -> f32 {
    if left == 0.0 && right == 0.0 {
        return 100.0;
    }
    (1.0 - (left - right).abs() / (left + right)) * 100.0
}

/// Step function over the 0-10 Borg CR10 rating
///
/// Moderate perceived effort (4-6) is the therapeutic target.
fn effort_score(rating: Option<u8>) -> f32 {
    match rating {
        Some(4..=6) => 100.0,
        Some(3 | 7) => 80.0,
        Some(2 | 8) => 60.0,
        Some(_) => 20.0,
        None => 0.0,
    }
}

fn game_score(points: Option<GamePoints>) -> f32 {
    match points {
        Some(p) if p.max > 0.0 => (p.achieved / p.max * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}
