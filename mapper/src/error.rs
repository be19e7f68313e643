//! Error types for configuration loading, command execution and frame input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a gesture configuration.
///
/// Only load and reload can fail; per-frame evaluation never returns these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gesture #{index} has an empty name")]
    EmptyGestureName { index: usize },

    #[error("gesture {name:?} is defined more than once")]
    DuplicateGesture { name: String },

    #[error("gesture {gesture:?} has no conditions")]
    EmptyConditions { gesture: String },

    #[error("gesture {gesture:?} condition {condition}: point index {point} outside [0, 20]")]
    PointOutOfRange {
        gesture: String,
        condition: usize,
        point: usize,
    },

    #[error("gesture {gesture:?} condition {condition}: {kind} needs min or max")]
    MissingBound {
        gesture: String,
        condition: usize,
        kind: &'static str,
    },

    #[error("gesture {gesture:?} condition {condition}: min {min} > max {max}")]
    InvertedRange {
        gesture: String,
        condition: usize,
        min: f32,
        max: f32,
    },

    #[error("gesture {gesture:?} condition {condition}: {reason}")]
    InvalidRegion {
        gesture: String,
        condition: usize,
        reason: String,
    },

    #[error("mapping {name:?} references an unknown gesture")]
    DanglingMapping { name: String },

    #[error("no gesture named {name:?}")]
    UnknownGesture { name: String },

    #[error("no mapping for gesture {name:?}")]
    UnknownMapping { name: String },

    #[error("mapping {gesture:?}: {reason}")]
    InvalidCommand { gesture: String, reason: String },

    #[error("mapping {gesture:?} analogue: {reason}")]
    InvalidAnalogue { gesture: String, reason: String },

    #[error("debounce: {reason}")]
    InvalidDebounce { reason: String },

    #[error("min_confidence {value} outside [0, 1]")]
    InvalidConfidence { value: f32 },
}

/// Failure reported by an effector for a single command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectorError {
    #[error("command failed: {reason}")]
    Failed { reason: String },
}

/// Errors from a keypoint source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read frames: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}
