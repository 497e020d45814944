//! Grid shape and placement of execution units.
//!
//! Placement is row-major: grid node `i` sits at `(i / cols, i % cols)` and
//! the coordinator takes the identity after the last grid node. The mapping
//! is deterministic, so every unit can derive its own position and its
//! neighbors' identities without talking to anyone.

use crate::error::{Result, TopologyError};
use crate::{Direction, GridCoord, Neighbors, NodeId, NEIGHBOR_SLOTS};

/// Dimensions of a validated, non-empty grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridShape {
    rows: usize,
    cols: usize,
}

impl GridShape {
    /// Validate dimensions.
    ///
    /// Both must be at least 1, and `rows * cols + 1` (grid plus coordinator)
    /// must be representable.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(TopologyError::EmptyGrid { rows, cols });
        }
        rows.checked_mul(cols)
            .and_then(|n| n.checked_add(1))
            .ok_or(TopologyError::TooLarge { rows, cols })?;
        Ok(Self { rows, cols })
    }

    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of grid nodes (excludes the coordinator).
    #[inline]
    pub const fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Execution units the run needs: one per cell plus the coordinator.
    #[inline]
    pub const fn unit_count(&self) -> usize {
        self.node_count() + 1
    }

    /// Whether `coord` lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// Coordinate of a grid node, or `None` for the coordinator and beyond.
    pub fn coord_of(&self, id: NodeId) -> Option<GridCoord> {
        (id.0 < self.node_count()).then(|| GridCoord::new(id.0 / self.cols, id.0 % self.cols))
    }

    /// Identity of the grid node at `coord`, if it is on the grid.
    pub fn id_of(&self, coord: GridCoord) -> Option<NodeId> {
        self.contains(coord)
            .then(|| NodeId(coord.row * self.cols + coord.col))
    }

    /// Neighbor in `direction`, `None` past an edge.
    pub fn neighbor(&self, coord: GridCoord, direction: Direction) -> Option<NodeId> {
        coord.step(direction).and_then(|c| self.id_of(c))
    }

    /// All four neighbor slots of `coord`.
    pub fn neighbors_at(&self, coord: GridCoord) -> Neighbors {
        let mut slots = [None; NEIGHBOR_SLOTS];
        for dir in Direction::ALL {
            slots[dir.index()] = self.neighbor(coord, dir);
        }
        Neighbors::new(slots)
    }

    /// Iterate over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| GridCoord::new(row, col)))
    }
}

impl std::fmt::Display for GridShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Where one grid node lives and who it talks to. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePlacement {
    pub id: NodeId,
    pub coord: GridCoord,
    pub neighbors: Neighbors,
}

/// Full topology for a run: shape plus every grid node's placement.
#[derive(Debug, Clone)]
pub struct GridTopology {
    shape: GridShape,
    placements: Vec<NodePlacement>,
}

impl GridTopology {
    /// Build the topology for `units` execution units.
    ///
    /// Fails before anything is built if `units` is not `rows * cols + 1`.
    pub fn new(shape: GridShape, units: usize) -> Result<Self> {
        if units != shape.unit_count() {
            return Err(TopologyError::UnitCountMismatch {
                expected: shape.unit_count(),
                actual: units,
            });
        }

        let placements = (0..shape.node_count())
            .map(|i| {
                let id = NodeId(i);
                let coord = GridCoord::new(i / shape.cols, i % shape.cols);
                NodePlacement {
                    id,
                    coord,
                    neighbors: shape.neighbors_at(coord),
                }
            })
            .collect();

        Ok(Self { shape, placements })
    }

    /// Convenience: validate dimensions and unit count in one go.
    pub fn from_dimensions(rows: usize, cols: usize, units: usize) -> Result<Self> {
        Self::new(GridShape::new(rows, cols)?, units)
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Identity of the coordinator (the last execution unit).
    #[inline]
    pub fn coordinator(&self) -> NodeId {
        NodeId(self.shape.node_count())
    }

    /// Placements of all grid nodes, indexed by identity.
    pub fn placements(&self) -> &[NodePlacement] {
        &self.placements
    }

    /// Placement of one grid node.
    pub fn placement(&self, id: NodeId) -> Option<&NodePlacement> {
        self.placements.get(id.0)
    }

    pub fn coord_of(&self, id: NodeId) -> Option<GridCoord> {
        self.placement(id).map(|p| p.coord)
    }

    pub fn neighbors_of(&self, id: NodeId) -> Option<Neighbors> {
        self.placement(id).map(|p| p.neighbors)
    }

    /// Iterate over grid node identities.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.placements.iter().map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn rejects_empty_grid() {
        assert_eq!(
            GridShape::new(0, 3),
            Err(TopologyError::EmptyGrid { rows: 0, cols: 3 })
        );
        assert!(GridShape::new(2, 0).is_err());
    }

    #[test]
    fn rejects_overflowing_grid() {
        assert!(matches!(
            GridShape::new(usize::MAX, 2),
            Err(TopologyError::TooLarge { .. })
        ));
        assert!(matches!(
            GridShape::new(usize::MAX, 1),
            Err(TopologyError::TooLarge { .. })
        ));
    }

    #[test]
    fn unit_count_must_match() {
        let shape = GridShape::new(2, 2).unwrap();
        assert_eq!(shape.unit_count(), 5);
        assert_eq!(
            GridTopology::new(shape, 4).unwrap_err(),
            TopologyError::UnitCountMismatch {
                expected: 5,
                actual: 4
            }
        );
        assert!(GridTopology::new(shape, 5).is_ok());
    }

    #[test]
    fn coordinator_is_last_unit() {
        let topo = GridTopology::from_dimensions(3, 4, 13).unwrap();
        assert_eq!(topo.coordinator(), NodeId(12));
        assert!(topo.placement(topo.coordinator()).is_none());
        assert_eq!(topo.shape().coord_of(NodeId(12)), None);
    }

    #[test]
    fn row_major_placement() {
        let shape = GridShape::new(3, 4).unwrap();
        assert_eq!(shape.coord_of(NodeId(0)), Some(GridCoord::new(0, 0)));
        assert_eq!(shape.coord_of(NodeId(5)), Some(GridCoord::new(1, 1)));
        assert_eq!(shape.coord_of(NodeId(11)), Some(GridCoord::new(2, 3)));
        assert_eq!(shape.id_of(GridCoord::new(2, 3)), Some(NodeId(11)));
        assert_eq!(shape.id_of(GridCoord::new(3, 0)), None);
    }

    #[test]
    fn neighbors_in_clockwise_order() {
        let topo = GridTopology::from_dimensions(3, 3, 10).unwrap();
        let centre = topo.neighbors_of(NodeId(4)).unwrap();
        assert_eq!(
            centre.slots(),
            [Some(NodeId(1)), Some(NodeId(5)), Some(NodeId(7)), Some(NodeId(3))]
        );
        let top_left = topo.neighbors_of(NodeId(0)).unwrap();
        assert_eq!(top_left.slots(), [None, Some(NodeId(1)), Some(NodeId(3)), None]);
    }

    #[test]
    fn single_cell_grid_has_no_neighbors() {
        let topo = GridTopology::from_dimensions(1, 1, 2).unwrap();
        assert_eq!(topo.neighbors_of(NodeId(0)), Some(Neighbors::NONE));
    }

    #[test]
    fn single_row_is_a_chain() {
        let topo = GridTopology::from_dimensions(1, 4, 5).unwrap();
        let counts: Vec<_> = topo.placements().iter().map(|p| p.neighbors.count()).collect();
        assert_eq!(counts, vec![1, 2, 2, 1]);
    }

    #[test]
    fn two_by_two_is_all_corners() {
        let topo = GridTopology::from_dimensions(2, 2, 5).unwrap();
        for p in topo.placements() {
            assert_eq!(p.neighbors.count(), 2, "node {} at {}", p.id, p.coord);
        }
    }

    fn is_corner(shape: GridShape, c: GridCoord) -> bool {
        (c.row == 0 || c.row == shape.rows() - 1) && (c.col == 0 || c.col == shape.cols() - 1)
    }

    fn is_edge(shape: GridShape, c: GridCoord) -> bool {
        c.row == 0 || c.col == 0 || c.row == shape.rows() - 1 || c.col == shape.cols() - 1
    }

    proptest! {
        #[test]
        fn placement_covers_rectangle_exactly_once(rows in 1usize..24, cols in 1usize..24) {
            let topo = GridTopology::from_dimensions(rows, cols, rows * cols + 1).unwrap();
            let coords: HashSet<_> = topo.placements().iter().map(|p| p.coord).collect();
            prop_assert_eq!(topo.placements().len(), rows * cols);
            prop_assert_eq!(coords.len(), rows * cols);
            for coord in topo.shape().coords() {
                prop_assert!(coords.contains(&coord));
            }
        }

        #[test]
        fn neighbor_counts_follow_position(rows in 2usize..20, cols in 2usize..20) {
            let topo = GridTopology::from_dimensions(rows, cols, rows * cols + 1).unwrap();
            let shape = topo.shape();
            for p in topo.placements() {
                let expected = if is_corner(shape, p.coord) {
                    2
                } else if is_edge(shape, p.coord) {
                    3
                } else {
                    4
                };
                prop_assert_eq!(p.neighbors.count(), expected);
            }
        }

        #[test]
        fn neighbor_links_are_mutual(rows in 1usize..16, cols in 1usize..16) {
            let topo = GridTopology::from_dimensions(rows, cols, rows * cols + 1).unwrap();
            for p in topo.placements() {
                for (dir, other) in p.neighbors.present() {
                    let back = topo.neighbors_of(other).unwrap().get(dir.opposite());
                    prop_assert_eq!(back, Some(p.id));
                    let oc = topo.coord_of(other).unwrap();
                    prop_assert_eq!(p.coord.manhattan(&oc), 1);
                }
            }
        }

        #[test]
        fn wrong_unit_count_is_rejected(rows in 1usize..16, cols in 1usize..16, delta in 1usize..4) {
            let units = rows * cols + 1;
            prop_assert!(GridTopology::from_dimensions(rows, cols, units - 1).is_err());
            prop_assert!(GridTopology::from_dimensions(rows, cols, units + delta).is_err());
        }
    }
}
