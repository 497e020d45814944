//! Four-way neighbor computation.
//!
//! Every grid node has four neighbor slots, always listed clockwise starting
//! from above: up, right, down, left. Slots that would fall outside the grid
//! are empty. Corners therefore have 2 present neighbors, non-corner edges 3
//! and interior cells 4 (on grids of at least 2×2).

use crate::{NodeId, NEIGHBOR_SLOTS};

/// One of the four orthogonal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in slot order (clockwise from above).
    pub const ALL: [Self; NEIGHBOR_SLOTS] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Slot index of this direction within a neighbor table.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    /// The direction pointing back at us from the neighbor.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    /// `(row, col)` delta of one step in this direction.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::Right => (0, 1),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Right => write!(f, "right"),
            Self::Down => write!(f, "down"),
            Self::Left => write!(f, "left"),
        }
    }
}

/// Neighbor identities of one grid node, indexed by [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbors {
    slots: [Option<NodeId>; NEIGHBOR_SLOTS],
}

impl Neighbors {
    /// A table with every slot empty (the only node of a 1×1 grid).
    pub const NONE: Self = Self {
        slots: [None; NEIGHBOR_SLOTS],
    };

    /// Build from raw slots in clockwise order.
    pub const fn new(slots: [Option<NodeId>; NEIGHBOR_SLOTS]) -> Self {
        Self { slots }
    }

    /// Neighbor in the given direction, if any.
    #[inline]
    pub fn get(&self, direction: Direction) -> Option<NodeId> {
        self.slots[direction.index()]
    }

    /// All four slots with their directions, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, Option<NodeId>)> + '_ {
        Direction::ALL.into_iter().map(|dir| (dir, self.get(dir)))
    }

    /// Only the slots that hold a neighbor.
    pub fn present(&self) -> impl Iterator<Item = (Direction, NodeId)> + '_ {
        self.iter().filter_map(|(dir, id)| id.map(|id| (dir, id)))
    }

    /// Number of present neighbors (0 to 4).
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Raw slots in clockwise order.
    pub const fn slots(&self) -> [Option<NodeId>; NEIGHBOR_SLOTS] {
        self.slots
    }
}
