//! Error types for exercise-core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::exercise::{ExerciseId, ExerciseKind};
use crate::profile::LearnerId;
use crate::types::DifficultyTier;

/// Stable, machine-readable failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientMaterial,
    InsufficientDistractors,
    NoExerciseAvailable,
    ContentUnavailable,
    ProfileUnavailable,
    ProfileWriteFailure,
    SessionConflict,
    InvalidState,
    UnknownExercise,
    Cancelled,
    InvalidConfig,
    InvalidContent,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientMaterial => "insufficient_material",
            Self::InsufficientDistractors => "insufficient_distractors",
            Self::NoExerciseAvailable => "no_exercise_available",
            Self::ContentUnavailable => "content_unavailable",
            Self::ProfileUnavailable => "profile_unavailable",
            Self::ProfileWriteFailure => "profile_write_failure",
            Self::SessionConflict => "session_conflict",
            Self::InvalidState => "invalid_state",
            Self::UnknownExercise => "unknown_exercise",
            Self::Cancelled => "cancelled",
            Self::InvalidConfig => "invalid_config",
            Self::InvalidContent => "invalid_content",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure handed to callers of the exercises manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Errors raised while synthesizing an exercise.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("not enough material for a {kind} exercise at {tier} tier: {reason}")]
    InsufficientMaterial {
        kind: ExerciseKind,
        tier: DifficultyTier,
        reason: String,
    },

    #[error("needed {needed} distractors but only {available} distinct candidates exist")]
    InsufficientDistractors { needed: usize, available: usize },
}

impl GenerationError {
    pub(crate) fn material(kind: ExerciseKind, tier: DifficultyTier, reason: impl Into<String>) -> Self {
        Self::InsufficientMaterial {
            kind,
            tier,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientMaterial { .. } => ErrorKind::InsufficientMaterial,
            Self::InsufficientDistractors { .. } => ErrorKind::InsufficientDistractors,
        }
    }
}

/// Content-store failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error("no text matches {0}")]
    NotFound(String),

    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

impl ContentError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ContentUnavailable
    }
}

/// Profile-store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("learner {0} is already in an active session")]
    SessionConflict(LearnerId),

    #[error("session token for learner {0} is missing or stale")]
    StaleToken(LearnerId),

    #[error("failed to read profile: {0}")]
    Read(String),

    #[error("failed to write profile: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionConflict(_) => ErrorKind::SessionConflict,
            Self::Read(_) => ErrorKind::ProfileUnavailable,
            Self::StaleToken(_) | Self::Write(_) | Self::Io(_) => ErrorKind::ProfileWriteFailure,
        }
    }
}

/// Failure inside a single grammar rule. Never leaves the checker.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("rule {rule} failed: {reason}")]
pub struct RuleError {
    pub rule: &'static str,
    pub reason: String,
}

/// Errors from `EngineConfig::validate`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tier thresholds must be 4 ascending values in [0, 1) starting at 0: {0:?}")]
    InvalidThresholds(Vec<f64>),

    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("promote_accuracy ({promote}) must exceed demote_accuracy ({demote})")]
    InvertedAccuracyBand { promote: f64, demote: f64 },

    #[error("unknown mastery model: {0}")]
    UnknownMasteryModel(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfig
    }
}

/// Errors that can occur while parsing a reading pack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("missing text at line {line}")]
    MissingText { line: usize },

    #[error("unknown tier at line {line}: {value}")]
    InvalidTier { line: usize, value: String },

    #[error("duplicate ID {id} at line {line}")]
    DuplicateId { id: String, line: usize },

    #[error("empty reading pack")]
    EmptyPack,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidContent
    }
}

/// Errors surfaced by the exercises manager.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("no exercise available after {attempts} attempts: {last}")]
    NoExerciseAvailable { attempts: usize, last: String },

    #[error("exercise {0} is not the outstanding exercise")]
    UnknownExercise(ExerciseId),

    #[error("cancelled while generating")]
    Cancelled,

    #[error("profile could not be saved: {0}")]
    ProfileWriteFailure(#[source] StoreError),

    #[error("profile store: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::NoExerciseAvailable { .. } => ErrorKind::NoExerciseAvailable,
            Self::UnknownExercise(_) => ErrorKind::UnknownExercise,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ProfileWriteFailure(_) => ErrorKind::ProfileWriteFailure,
            Self::Store(e) => e.kind(),
        }
    }

    /// Whether the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ProfileWriteFailure(_))
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<&SessionError> for ErrorReport {
    fn from(err: &SessionError) -> Self {
        err.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_write_errors_are_fatal_to_the_session() {
        let err = SessionError::ProfileWriteFailure(StoreError::Write("disk full".into()));
        assert!(err.is_fatal());
        assert_eq!(err.report().kind, ErrorKind::ProfileWriteFailure);
        assert!(err.report().message.contains("disk full"));
    }

    #[test]
    fn generation_errors_carry_their_kind() {
        let err = GenerationError::InsufficientDistractors {
            needed: 3,
            available: 1,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientDistractors);
        assert_eq!(
            err.to_string(),
            "needed 3 distractors but only 1 distinct candidates exist"
        );
    }
}
