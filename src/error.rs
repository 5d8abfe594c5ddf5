//! Error types for the automaton.

use thiserror::Error;

use crate::grid::Position;

#[derive(Error, Debug)]
pub enum SircaError {
    /// Rejected parameters, reported before the first tick runs.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every infected neighbour of the cell carries zero weight, so no donor
    /// can be drawn.
    #[error("No eligible donor around {position:?}: all infectiousness weights are zero")]
    DegenerateWeightedChoice { position: Position },

    /// A statistic was requested over a subset that is empty this tick.
    #[error("Empty aggregate: no cells to compute {0} over")]
    EmptyAggregate(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SircaError {
    pub fn config(message: impl Into<String>) -> Self {
        SircaError::Configuration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SircaError>;
