//! Error types shared across the solver.
//!
//! Only malformed input and bad configuration are errors. A search that runs
//! out of states or is interrupted is a normal outcome and is reported through
//! [`crate::solver::SolveOutcome`] instead.

use thiserror::Error;

use crate::config::ConfigError;

/// Failure raised before or outside of a search.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The board description does not fit the topology or uses an unknown tag.
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    /// A move was requested that is not legal on the current board.
    #[error("illegal move ({0}, {1})")]
    IllegalMove(usize, usize),

    /// The neighbour table describing a topology is inconsistent.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// The board generator could not place every pair.
    #[error("board generation failed after {attempts} attempts")]
    GenerationFailed { attempts: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SolverError {
    pub(crate) fn invalid_board(reason: impl Into<String>) -> Self {
        SolverError::InvalidBoard(reason.into())
    }
}
