//! Grid coordinates and node identities.
//!
//! Coordinates are zero-indexed `(row, col)` pairs in row-major order: row 0
//! is the top edge, col 0 the left edge. Nothing wraps around, so stepping off
//! an edge yields `None` rather than the opposite side.

use crate::Direction;

/// A position on the sensor grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCoord {
    /// Row index, growing downwards
    pub row: usize,
    /// Column index, growing to the right
    pub col: usize,
}

impl GridCoord {
    /// Top-left corner of every grid.
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    /// Create a new coordinate.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Step one cell in `direction`.
    ///
    /// Returns `None` when the step would leave the grid through row 0 or
    /// col 0. The far edges are checked by [`GridShape::contains`](crate::GridShape::contains).
    pub fn step(&self, direction: Direction) -> Option<Self> {
        let (dr, dc) = direction.offset();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Some(Self { row, col })
    }

    /// Manhattan distance between two cells.
    pub fn manhattan(&self, other: &Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Identity of an execution unit.
///
/// Grid nodes hold `0..rows*cols`; the coordinator holds the last identity,
/// `rows*cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub usize);

impl NodeId {
    /// Get the raw index value.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
