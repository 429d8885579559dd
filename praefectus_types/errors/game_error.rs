use thiserror::Error;

/// Errors for domain logic (buildings, strategies).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Building {0:?} does not exist")]
    UnknownBuilding(String),

    #[error("Invalid strategy line {line:?}: {reason}")]
    InvalidStrategyLine { line: String, reason: String },
}
