use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::AssessmentType;

/// Failures raised by the scoring core. Expected "no data" conditions are
/// modelled as `Option` by the calculators and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("malformed weight tree: {0}")]
    MalformedTree(String),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),
}

impl EngineError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTree(_) => "malformed_tree",
            Self::Validation { .. } => "validation_failed",
            Self::UnknownParticipant(_) => "unknown_participant",
        }
    }
}

/// A completion transition that was refused. The record it was attempted on
/// is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionRejected {
    #[error("deadline passed at {deadline}, {assessment_type} can no longer be changed")]
    DeadlinePassed {
        assessment_type: AssessmentType,
        deadline: DateTime<Utc>,
    },

    #[error("already marked final")]
    AlreadyFinal,

    #[error("not marked final")]
    NotFinal,

    #[error("invalid grade suggestion: {0}")]
    InvalidGrade(String),
}

impl TransitionRejected {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DeadlinePassed { .. } => "deadline_passed",
            Self::AlreadyFinal => "already_final",
            Self::NotFinal => "not_final",
            Self::InvalidGrade(_) => "validation_failed",
        }
    }
}
