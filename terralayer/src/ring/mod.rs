//! Ring bookkeeping for a clipmap level.
//!
//! A level's tile grid is a fixed 2×2 ring. Every tile carries a
//! [`Corner`] label; the four seams between adjacent tiles carry a
//! [`SeamSide`] label. All adjacency, displacement and seam lookups are
//! exhaustive matches over these closed enumerations rather than string-keyed
//! maps, so a typo is a compile error and every table is statically total.

mod tables;

pub use tables::{seam_adjacent_corners, tile_corner_seams, tile_delta};

use glam::DVec2;

/// Corner label of a tile within its level's 2×2 ring.
///
/// The label is fixed to the tile's physical grid slot: row 0 is the north
/// (−z) row, column 0 the west (−x) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// All corners in physical grid order (row-major).
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Stable index used for fixed-size per-corner arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }

    /// Grid row of this corner (0 = north).
    #[inline]
    pub fn row(self) -> usize {
        match self {
            Corner::TopLeft | Corner::TopRight => 0,
            Corner::BottomLeft | Corner::BottomRight => 1,
        }
    }

    /// Grid column of this corner (0 = west).
    #[inline]
    pub fn col(self) -> usize {
        match self {
            Corner::TopLeft | Corner::BottomLeft => 0,
            Corner::TopRight | Corner::BottomRight => 1,
        }
    }

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// The two seams touching this corner's tile.
    #[inline]
    pub fn seams(self) -> [SeamSide; 2] {
        tile_corner_seams(self)
    }
}

/// One of the four seams between adjacent tiles of a 2×2 ring, named by the
/// side of the ring it lies toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeamSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl SeamSide {
    /// All seams, in guard-array order.
    pub const ALL: [SeamSide; 4] = [
        SeamSide::Top,
        SeamSide::Right,
        SeamSide::Bottom,
        SeamSide::Left,
    ];

    /// Stable index used for fixed-size per-seam arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            SeamSide::Top => 0,
            SeamSide::Right => 1,
            SeamSide::Bottom => 2,
            SeamSide::Left => 3,
        }
    }

    /// The two tiles adjacent to this seam, ordered so the first is the
    /// stitching authority (its corner heights win).
    #[inline]
    pub fn tiles(self) -> [Corner; 2] {
        seam_adjacent_corners(self)
    }
}

/// Classification of a fine tile's position relative to its parent level's
/// ring center.
///
/// Edge variants mean the tile sits half a parent tile width off-center along
/// exactly one axis; diagonal variants mean both axes. `Center` tiles sit on
/// the parent ring center and need no cross-level reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipSide {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ClipSide {
    /// Whether this clip side is a single-axis edge (the fully stitched
    /// cases).
    pub fn is_edge(self) -> bool {
        matches!(
            self,
            ClipSide::Top | ClipSide::Bottom | ClipSide::Left | ClipSide::Right
        )
    }
}

/// Classifies a fine tile's center against the parent ring center.
///
/// Offsets are quantized per axis at half the threshold, so anything beyond a
/// quarter parent tile counts as off-center on that axis.
pub fn classify_clip_side(tile_center: DVec2, parent_anchor: DVec2, half_parent: f64) -> ClipSide {
    let threshold = half_parent / 2.0;
    let qx = quantize(tile_center.x - parent_anchor.x, threshold);
    let qz = quantize(tile_center.y - parent_anchor.y, threshold);

    match (qx, qz) {
        (0, 0) => ClipSide::Center,
        (0, -1) => ClipSide::Top,
        (0, 1) => ClipSide::Bottom,
        (-1, 0) => ClipSide::Left,
        (1, 0) => ClipSide::Right,
        (-1, -1) => ClipSide::TopLeft,
        (1, -1) => ClipSide::TopRight,
        (-1, 1) => ClipSide::BottomLeft,
        (1, 1) => ClipSide::BottomRight,
        _ => unreachable!("quantize returns -1, 0 or 1"),
    }
}

#[inline]
fn quantize(delta: f64, threshold: f64) -> i8 {
    if delta > threshold {
        1
    } else if delta < -threshold {
        -1
    } else {
        0
    }
}

/// Picks the ring corner geometrically closest to the observer, by squared
/// distance against the four corner points of the current center tile.
///
/// Iteration order is fixed (grid order), which resolves exact ties
/// deterministically.
pub fn closest_corner(observer: DVec2, tile_center: DVec2, half_tile: f64) -> Corner {
    let mut best = Corner::TopLeft;
    let mut best_dist = f64::INFINITY;

    for corner in Corner::ALL {
        let sx = if corner.col() == 0 { -1.0 } else { 1.0 };
        let sz = if corner.row() == 0 { -1.0 } else { 1.0 };
        let point = DVec2::new(
            tile_center.x + sx * half_tile,
            tile_center.y + sz * half_tile,
        );
        let dist = observer.distance_squared(point);
        if dist < best_dist {
            best_dist = dist;
            best = corner;
        }
    }

    best
}

/// Circularly shifts a ring row (or the row list itself) by one position,
/// inserting `fresh` at the leading edge and returning the evicted trailing
/// element.
///
/// `delta > 0` shifts toward +axis: the front element falls off and `fresh`
/// is appended; `delta < 0` is the mirror.
pub fn shift_row<T>(row: &mut Vec<T>, delta: i32, fresh: T) -> T {
    if delta > 0 {
        row.push(fresh);
        row.remove(0)
    } else {
        row.insert(0, fresh);
        row.pop().expect("ring rows are never empty")
    }
}
