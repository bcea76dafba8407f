// src/config/mod.rs
//! Configuration management for the analytics pipeline

pub mod constants;
pub mod parameters;
pub mod session;

pub use parameters::{
    ConditionerParams, DetectorParams, ParameterError, ProcessingParameters, SpectralParams,
    TemporalParams, ThresholdProfile,
};
pub use session::{
    ChannelOverrides, ComplianceWeights, GamePoints, ScoringWeights, SessionOverrides,
    SessionParameters,
};
