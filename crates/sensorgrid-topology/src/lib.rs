//! Sensorgrid Topology
//!
//! Rectangular grid topology for a sensor field with one coordinating unit.
//!
//! # Layout
//!
//! A `rows × cols` grid is populated row-major from identity 0. Each grid node
//! has four neighbor slots in fixed clockwise order starting from above
//! (up, right, down, left). The grid does not wrap, so slots pointing off an
//! edge stay empty:
//!
//! - corners: 2 neighbors
//! - other edge cells: 3 neighbors
//! - interior cells: 4 neighbors
//!
//! The coordinator is the extra execution unit after the last grid node, so a
//! run always needs exactly `rows * cols + 1` units. A mismatch is rejected
//! before any placement is computed.

mod coord;
mod error;
mod grid;
mod neighbors;

pub use coord::{GridCoord, NodeId};
pub use error::{Result, TopologyError};
pub use grid::{GridShape, GridTopology, NodePlacement};
pub use neighbors::{Direction, Neighbors};

/// Neighbor slots per grid node (invariant: always 4, some possibly empty).
pub const NEIGHBOR_SLOTS: usize = 4;

// Compile-time assertion that every direction has a slot
const _: () = assert!(Direction::ALL.len() == NEIGHBOR_SLOTS);
