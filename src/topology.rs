//! Fixed cell layout of a puzzle.
//!
//! A `Topology` is built once per puzzle shape and shared read-only (behind an
//! `Arc`) by every board state of that puzzle. Each cell has six neighbour
//! slots listed in circular order around the cell; `None` marks a slot that
//! lies off the board.
use crate::error::SolverError;
use std::collections::HashMap;

/// Largest number of cells a topology may hold (the width of [`crate::engine::CellSet`]).
pub const MAX_CELLS: usize = 128;

/// Largest hexagon radius that fits in [`MAX_CELLS`] (127 cells).
pub const MAX_RADIUS: u32 = 6;

/// Radius of the regular puzzle board (91 cells).
pub const STANDARD_RADIUS: u32 = 5;

/// Axial offsets of the six neighbours of a pointy-top hex, in circular order.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    neighbors: Vec<[Option<usize>; 6]>,
    axial: Option<Vec<(i32, i32)>>,
    radius: Option<u32>,
}

impl Topology {
    /// Builds a regular hexagon of the given radius.
    ///
    /// Cells are indexed column by column: `q` runs from `-radius` to `radius`
    /// and, inside each column, `r` increases. This matches the index order a
    /// board scanner emits, so cell lists can be fed in directly.
    ///
    /// # Examples
    /// ```
    /// use sigmar_solver::topology::Topology;
    /// let topology = Topology::hexagon(5).unwrap();
    /// assert_eq!(topology.cell_count(), 91);
    /// assert!(Topology::hexagon(7).is_err());
    /// ```
    pub fn hexagon(radius: u32) -> Result<Self, SolverError> {
        if radius > MAX_RADIUS {
            return Err(SolverError::InvalidTopology(format!(
                "hexagon radius {} exceeds {}, at most {} cells are supported",
                radius, MAX_RADIUS, MAX_CELLS
            )));
        }
        let r = radius as usize;
        let count = 3 * r * (r + 1) + 1;

        let radius_i = radius as i32;
        let mut axial = Vec::with_capacity(count);
        let mut index_of = HashMap::with_capacity(count);
        for q in -radius_i..=radius_i {
            let r1 = (-radius_i).max(-q - radius_i);
            let r2 = radius_i.min(-q + radius_i);
            for r in r1..=r2 {
                index_of.insert((q, r), axial.len());
                axial.push((q, r));
            }
        }

        let neighbors = axial
            .iter()
            .map(|&(q, r)| {
                let mut slots = [None; 6];
                for (slot, (dq, dr)) in slots.iter_mut().zip(DIRECTIONS) {
                    *slot = index_of.get(&(q + dq, r + dr)).copied();
                }
                slots
            })
            .collect();

        Ok(Topology {
            neighbors,
            axial: Some(axial),
            radius: Some(radius),
        })
    }

    /// The regular 91-cell board.
    pub fn standard() -> Self {
        match Topology::hexagon(STANDARD_RADIUS) {
            Ok(topology) => topology,
            Err(e) => unreachable!("standard radius is within bounds: {}", e),
        }
    }

    /// A straight row of `len` cells, handy for small hand-built puzzles.
    ///
    /// Cell `i` sees `i + 1` in slot 0 and `i - 1` in slot 1. The remaining
    /// four slots are off the board, so every cell of a line is spatially free.
    pub fn line(len: usize) -> Result<Self, SolverError> {
        let neighbors = (0..len)
            .map(|i| {
                let mut slots = [None; 6];
                if i + 1 < len {
                    slots[0] = Some(i + 1);
                }
                if i > 0 {
                    slots[1] = Some(i - 1);
                }
                slots
            })
            .collect();
        Topology::from_neighbors(neighbors)
    }

    /// Builds a topology from an explicit neighbour table.
    ///
    /// The table must reference only existing cells, never a cell itself, and
    /// be symmetric: if `a` lists `b`, `b` lists `a`.
    pub fn from_neighbors(neighbors: Vec<[Option<usize>; 6]>) -> Result<Self, SolverError> {
        let count = neighbors.len();
        if count > MAX_CELLS {
            return Err(SolverError::InvalidTopology(format!(
                "{} cells exceeds the limit of {}",
                count, MAX_CELLS
            )));
        }
        for (idx, slots) in neighbors.iter().enumerate() {
            for &n in slots.iter().flatten() {
                if n >= count {
                    return Err(SolverError::InvalidTopology(format!(
                        "cell {} references missing cell {}",
                        idx, n
                    )));
                }
                if n == idx {
                    return Err(SolverError::InvalidTopology(format!(
                        "cell {} lists itself as a neighbour",
                        idx
                    )));
                }
                if !neighbors[n].contains(&Some(idx)) {
                    return Err(SolverError::InvalidTopology(format!(
                        "cell {} lists {} but not the other way round",
                        idx, n
                    )));
                }
            }
        }
        Ok(Topology {
            neighbors,
            axial: None,
            radius: None,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbour slots of `idx` in circular order.
    ///
    /// # Panics
    /// Panics if `idx` is not a cell of this topology.
    pub fn neighbors(&self, idx: usize) -> &[Option<usize>; 6] {
        &self.neighbors[idx]
    }

    /// Axial `(q, r)` coordinate of a cell, for hexagon topologies.
    pub fn axial(&self, idx: usize) -> Option<(i32, i32)> {
        self.axial.as_ref().and_then(|a| a.get(idx).copied())
    }

    pub fn radius(&self) -> Option<u32> {
        self.radius
    }

    /// Cell indices grouped into screen rows (constant `r`), left to right.
    ///
    /// Returns `None` for topologies without axial coordinates.
    pub fn rows(&self) -> Option<Vec<Vec<usize>>> {
        let axial = self.axial.as_ref()?;
        let radius = self.radius? as i32;
        let mut rows = vec![Vec::new(); (2 * radius + 1) as usize];
        for (idx, &(_, r)) in axial.iter().enumerate() {
            rows[(r + radius) as usize].push(idx);
        }
        for row in rows.iter_mut() {
            row.sort_by_key(|&idx| axial[idx].0);
        }
        Some(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexagon_cell_counts() {
        assert_eq!(Topology::hexagon(0).unwrap().cell_count(), 1);
        assert_eq!(Topology::hexagon(1).unwrap().cell_count(), 7);
        assert_eq!(Topology::standard().cell_count(), 91);
        assert_eq!(Topology::hexagon(6).unwrap().cell_count(), 127);
    }

    #[test]
    fn test_hexagon_too_large() {
        let err = Topology::hexagon(7).unwrap_err();
        assert!(matches!(err, SolverError::InvalidTopology(_)));
        assert!(Topology::hexagon(MAX_RADIUS).is_ok());
        assert!(Topology::hexagon(u32::MAX).is_err());
        assert!(Topology::hexagon(4_000_000_000).is_err());
    }

    #[test]
    fn test_hexagon_index_order() {
        let topology = Topology::hexagon(1).unwrap();
        // q = -1 column holds r = 0, 1; q = 0 holds r = -1, 0, 1; q = 1 holds r = -1, 0.
        let expected = [(-1, 0), (-1, 1), (0, -1), (0, 0), (0, 1), (1, -1), (1, 0)];
        for (idx, coord) in expected.iter().enumerate() {
            assert_eq!(topology.axial(idx), Some(*coord));
        }
    }

    #[test]
    fn test_center_has_six_neighbors() {
        let topology = Topology::hexagon(1).unwrap();
        let center = 3;
        let slots = topology.neighbors(center);
        assert!(slots.iter().all(|s| s.is_some()));
        let mut around: Vec<usize> = slots.iter().flatten().copied().collect();
        around.sort_unstable();
        assert_eq!(around, vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_corner_neighbors_are_circular() {
        let topology = Topology::hexagon(1).unwrap();
        // (1, -1) is index 5; its on-board neighbours are (0,-1), (0,0), (1,0)
        // and they must sit in three adjacent slots.
        let slots = topology.neighbors(5);
        let on_board: Vec<bool> = slots.iter().map(|s| s.is_some()).collect();
        assert_eq!(on_board.iter().filter(|b| **b).count(), 3);
        let run = (0..6).any(|start| (0..3).all(|k| on_board[(start + k) % 6]));
        assert!(run, "on-board neighbours should be contiguous: {:?}", on_board);
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        let topology = Topology::standard();
        for idx in 0..topology.cell_count() {
            for &n in topology.neighbors(idx).iter().flatten() {
                assert!(topology.neighbors(n).contains(&Some(idx)));
            }
        }
    }

    #[test]
    fn test_line_topology() {
        let topology = Topology::line(3).unwrap();
        assert_eq!(topology.cell_count(), 3);
        assert_eq!(topology.neighbors(1)[0], Some(2));
        assert_eq!(topology.neighbors(1)[1], Some(0));
        assert_eq!(topology.axial(0), None);
        assert!(topology.rows().is_none());
    }

    #[test]
    fn test_from_neighbors_rejects_asymmetry() {
        let table = vec![[Some(1), None, None, None, None, None], [None; 6]];
        assert!(Topology::from_neighbors(table).is_err());
    }

    #[test]
    fn test_from_neighbors_rejects_out_of_range() {
        let table = vec![[Some(5), None, None, None, None, None]];
        assert!(Topology::from_neighbors(table).is_err());
    }

    #[test]
    fn test_rows_cover_every_cell() {
        let topology = Topology::standard();
        let rows = topology.rows().unwrap();
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[0].len(), 6);
        assert_eq!(rows[5].len(), 11);
        let total: usize = rows.iter().map(|r| r.len()).sum();
        assert_eq!(total, 91);
    }
}
