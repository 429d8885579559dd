use thiserror::Error;

/// Errors for app logic.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Village {0} not found in config")]
    VillageNotConfigured(u32),

    #[error("Building strategy {0:?} not found")]
    StrategyNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
