//! Static adjacency and displacement tables for the 2×2 ring.

use super::{Corner, SeamSide};

/// Displacement `(dz, dx)` of a corner's tile from the ring origin (the
/// observer's current tile index), given which corner is currently active.
///
/// The active corner's own tile always sits at the origin; the other three
/// extend away from it. Every component is −1, 0 or 1.
pub fn tile_delta(active: Corner, corner: Corner) -> (i32, i32) {
    use Corner::*;

    match active {
        TopLeft => match corner {
            TopLeft => (0, 0),
            TopRight => (0, 1),
            BottomLeft => (1, 0),
            BottomRight => (1, 1),
        },
        TopRight => match corner {
            TopLeft => (0, -1),
            TopRight => (0, 0),
            BottomLeft => (1, -1),
            BottomRight => (1, 0),
        },
        BottomLeft => match corner {
            TopLeft => (-1, 0),
            TopRight => (-1, 1),
            BottomLeft => (0, 0),
            BottomRight => (0, 1),
        },
        BottomRight => match corner {
            TopLeft => (-1, -1),
            TopRight => (-1, 0),
            BottomLeft => (0, -1),
            BottomRight => (0, 0),
        },
    }
}

/// The two seams adjacent to a given corner's tile.
pub fn tile_corner_seams(corner: Corner) -> [SeamSide; 2] {
    match corner {
        Corner::TopLeft => [SeamSide::Top, SeamSide::Left],
        Corner::TopRight => [SeamSide::Top, SeamSide::Right],
        Corner::BottomRight => [SeamSide::Bottom, SeamSide::Right],
        Corner::BottomLeft => [SeamSide::Bottom, SeamSide::Left],
    }
}

/// The two corner tiles a seam runs between. The first entry is tile A in
/// stitching (the authority for corner vertices).
pub fn seam_adjacent_corners(seam: SeamSide) -> [Corner; 2] {
    match seam {
        SeamSide::Top => [Corner::TopLeft, Corner::TopRight],
        SeamSide::Right => [Corner::TopRight, Corner::BottomRight],
        SeamSide::Bottom => [Corner::BottomLeft, Corner::BottomRight],
        SeamSide::Left => [Corner::TopLeft, Corner::BottomLeft],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::Corner::*;

    #[test]
    fn test_active_corner_sits_at_origin() {
        for active in Corner::ALL {
            assert_eq!(tile_delta(active, active), (0, 0));
        }
    }

    #[test]
    fn test_deltas_span_one_tile_only() {
        for active in Corner::ALL {
            for corner in Corner::ALL {
                let (dz, dx) = tile_delta(active, corner);
                assert!(dz.abs() <= 1 && dx.abs() <= 1);
            }
        }
    }

    #[test]
    fn test_deltas_preserve_grid_layout() {
        // Whatever the active corner, TopRight is always one tile east of
        // TopLeft and BottomLeft one tile south of it.
        for active in Corner::ALL {
            let (tl_z, tl_x) = tile_delta(active, TopLeft);
            let (tr_z, tr_x) = tile_delta(active, TopRight);
            let (bl_z, bl_x) = tile_delta(active, BottomLeft);
            assert_eq!((tr_z, tr_x), (tl_z, tl_x + 1));
            assert_eq!((bl_z, bl_x), (tl_z + 1, tl_x));
        }
    }

    #[test]
    fn test_every_seam_touches_its_corner_tiles() {
        for seam in SeamSide::ALL {
            for corner in seam_adjacent_corners(seam) {
                assert!(
                    tile_corner_seams(corner).contains(&seam),
                    "{seam:?} missing from {corner:?} seam list"
                );
            }
        }
    }
}
