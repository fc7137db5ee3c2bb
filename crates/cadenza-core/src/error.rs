//! Error types for cadenza

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("Pitch out of range: {0} (expected 0-127)")]
    Range(i32),
    #[error("Interval out of range: {0} semitones (expected 0-12)")]
    IntervalRange(i32),
    #[error("Unknown scale: {0}")]
    UnknownScale(String),
    #[error("Unknown chord quality: {0}")]
    UnknownChord(String),
    #[error("Invalid pitch name: {0:?}")]
    InvalidName(String),
    #[error("Invalid degree {label:?} in {key}")]
    InvalidDegree { label: String, key: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, TheoryError>;
