//! Shared-edge vertex index mapping between adjacent tiles.

use crate::ring::Corner;

/// Relative placement of tile B against tile A, derived from their ring
/// corner labels. Diagonal pairs share no edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// B is east of A: A's right column meets B's left column.
    BRightOfA,
    /// B is west of A.
    BLeftOfA,
    /// B is south of A: A's bottom row meets B's top row.
    BBelowA,
    /// B is north of A.
    BAboveA,
}

impl Orientation {
    /// Derives the orientation from two ring corner labels, or `None` when
    /// the tiles are diagonal neighbors.
    pub fn between(a: Corner, b: Corner) -> Option<Orientation> {
        if a == b {
            return None;
        }
        if a.row() == b.row() {
            return Some(if b.col() > a.col() {
                Orientation::BRightOfA
            } else {
                Orientation::BLeftOfA
            });
        }
        if a.col() == b.col() {
            return Some(if b.row() > a.row() {
                Orientation::BBelowA
            } else {
                Orientation::BAboveA
            });
        }
        None
    }

    /// Vertex index on tile A for step `i` along the shared edge, for a tile
    /// with `n` vertices per side.
    #[inline]
    pub fn index_a(self, n: usize, i: usize) -> usize {
        match self {
            Orientation::BRightOfA => i * n + (n - 1),
            Orientation::BLeftOfA => i * n,
            Orientation::BBelowA => (n - 1) * n + i,
            Orientation::BAboveA => i,
        }
    }

    /// Vertex index on tile B for step `i` along the shared edge.
    #[inline]
    pub fn index_b(self, n: usize, i: usize) -> usize {
        match self {
            Orientation::BRightOfA => i * n,
            Orientation::BLeftOfA => i * n + (n - 1),
            Orientation::BBelowA => i,
            Orientation::BAboveA => (n - 1) * n + i,
        }
    }
}
