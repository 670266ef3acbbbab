use thiserror::Error;

use crate::models::TournamentStatus;

/// 토너먼트 엔진 오류
///
/// All variants are non-fatal: an operation that returns one of these has
/// left the tournament state untouched.
#[derive(Error, Debug)]
pub enum TournamentError {
    #[error("Invalid competitor count for {format}: expected {expected}, found {found}")]
    InvalidCompetitorCount { format: String, expected: usize, found: usize },

    #[error("Duplicate competitor id: {0}")]
    DuplicateCompetitor(String),

    #[error("Unknown competitor: {0}")]
    UnknownCompetitor(String),

    #[error("Operation not allowed while tournament is {status:?}")]
    InvalidStatus { status: TournamentStatus },

    #[error("Current match pointer is invalid (round {round}, match {index})")]
    InvalidPointer { round: usize, index: usize },

    #[error("Submitted result is for match ({round}, {index}) but the live match is elsewhere")]
    MatchMismatch { round: usize, index: usize },

    #[error("Tournament belongs to {expected}, not {found}")]
    OwnerMismatch { expected: String, found: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TournamentError {
    /// Short machine-readable code, used by the JSON API envelope.
    pub fn code(&self) -> &'static str {
        match self {
            TournamentError::InvalidCompetitorCount { .. } => "INVALID_COMPETITOR_COUNT",
            TournamentError::DuplicateCompetitor(_) => "DUPLICATE_COMPETITOR",
            TournamentError::UnknownCompetitor(_) => "UNKNOWN_COMPETITOR",
            TournamentError::InvalidStatus { .. } => "INVALID_STATUS",
            TournamentError::InvalidPointer { .. } => "INVALID_POINTER",
            TournamentError::MatchMismatch { .. } => "MATCH_MISMATCH",
            TournamentError::OwnerMismatch { .. } => "OWNER_MISMATCH",
            TournamentError::InvalidConfig(_) => "INVALID_CONFIG",
            TournamentError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for TournamentError {
    fn from(err: serde_json::Error) -> Self {
        TournamentError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TournamentError>;
