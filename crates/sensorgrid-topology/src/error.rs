//! Error types for sensorgrid-topology.

use thiserror::Error;

/// Result type for topology construction.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Configuration errors detected before any topology is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A grid dimension was zero.
    #[error("rows and cols must be larger than 0 (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    /// `rows * cols + 1` does not fit in a `usize`.
    #[error("grid of {rows}x{cols} is too large")]
    TooLarge { rows: usize, cols: usize },

    /// The bootstrap layer supplied the wrong number of execution units.
    #[error("must run with (rows * cols + 1) = {expected} execution units instead of {actual}")]
    UnitCountMismatch { expected: usize, actual: usize },
}
