//! Error types for sensorgrid-protocols.

use sensorgrid_topology::NodeId;
use thiserror::Error;

/// Result type for sensorgrid-protocols operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while a unit is running.
///
/// Lost messages and crashed peers are outside the model; these variants
/// cover the faults the channels still make observable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A neighbor posted a value for a different round than ours.
    #[error("node {peer} posted round {actual} while node {node} was exchanging round {expected}")]
    RoundMismatch {
        node: NodeId,
        peer: NodeId,
        expected: u64,
        actual: u64,
    },

    /// The coordinator was asked to run zero rounds.
    #[error("coordinator needs at least one round")]
    NoRounds,
}
