//! Tile state and clip planes.

use crate::geometry::TileMesh;
use crate::ring::{ClipSide, Corner};
use glam::{DVec2, Vec3};

/// Logical and world-space placement of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePos {
    /// Logical grid x index at this level's tile size.
    pub nx: i32,
    /// Logical grid z index.
    pub nz: i32,
    /// World-space (scene-local) center x.
    pub x: f64,
    /// World-space (scene-local) center z.
    pub z: f64,
}

impl TilePos {
    /// The tile's world-space center on the horizontal plane.
    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.z)
    }
}

/// One cell of a clipmap level's ring.
///
/// Created empty at level construction and recycled in place as the ring
/// shifts; only the mesh is replaced wholesale on rebuild. The height samples
/// and the mesh's vertex heights are always produced by the same rebuild
/// pass — stitching edits the mesh buffers but leaves the samples alone,
/// except for cross-level stitching which rewrites boundary samples to keep
/// the fine ring in agreement with its parent.
#[derive(Debug)]
pub struct Tile {
    /// Ring corner label (fixed to the physical grid slot).
    pub corner: Corner,
    /// Placement; `None` until the first rebuild touches the tile.
    pub pos: Option<TilePos>,
    /// Raw height samples backing the current mesh, row-major.
    pub heights: Vec<f32>,
    /// The committed mesh, if any.
    pub mesh: Option<TileMesh>,
    /// Position class against the parent ring center, when this level has a
    /// parent.
    pub clip_side: Option<ClipSide>,
    /// Planes the scene owner applies to suppress doubly rendered coarse
    /// geometry under this tile.
    pub clip_planes: Vec<ClipPlane>,
}

impl Tile {
    /// A fresh, unbuilt tile for a grid slot.
    pub(crate) fn empty(corner: Corner) -> Self {
        Self {
            corner,
            pos: None,
            heights: Vec::new(),
            mesh: None,
            clip_side: None,
            clip_planes: Vec::new(),
        }
    }
}

/// A world-space clipping plane in the three.js convention: a point `p` is
/// kept when `normal · p + constant >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub normal: Vec3,
    pub constant: f32,
}

/// Clip planes for a tile at the given clip side.
///
/// Edge sides get one plane at the tile's outer boundary, half a parent tile
/// away from its center along the off-axis; diagonal sides combine the two
/// adjacent edges' planes. Center tiles need none.
pub fn clip_planes_for(side: ClipSide, center: DVec2, half_parent: f64) -> Vec<ClipPlane> {
    let top = || ClipPlane {
        normal: Vec3::Z,
        constant: -(center.y - half_parent) as f32,
    };
    let bottom = || ClipPlane {
        normal: Vec3::NEG_Z,
        constant: (center.y + half_parent) as f32,
    };
    let left = || ClipPlane {
        normal: Vec3::X,
        constant: -(center.x - half_parent) as f32,
    };
    let right = || ClipPlane {
        normal: Vec3::NEG_X,
        constant: (center.x + half_parent) as f32,
    };

    match side {
        ClipSide::Center => Vec::new(),
        ClipSide::Top => vec![top()],
        ClipSide::Bottom => vec![bottom()],
        ClipSide::Left => vec![left()],
        ClipSide::Right => vec![right()],
        ClipSide::TopLeft => vec![top(), left()],
        ClipSide::TopRight => vec![top(), right()],
        ClipSide::BottomLeft => vec![bottom(), left()],
        ClipSide::BottomRight => vec![bottom(), right()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_needs_no_planes() {
        assert!(clip_planes_for(ClipSide::Center, DVec2::ZERO, 64.0).is_empty());
    }

    #[test]
    fn test_edge_sides_get_one_plane() {
        for side in [ClipSide::Top, ClipSide::Bottom, ClipSide::Left, ClipSide::Right] {
            assert_eq!(clip_planes_for(side, DVec2::ZERO, 64.0).len(), 1);
        }
    }

    #[test]
    fn test_diagonal_sides_get_two_planes() {
        let planes = clip_planes_for(ClipSide::TopLeft, DVec2::new(-64.0, -64.0), 64.0);
        assert_eq!(planes.len(), 2);
        assert_eq!(planes[0].normal, Vec3::Z);
        assert_eq!(planes[1].normal, Vec3::X);
    }

    #[test]
    fn test_plane_sits_half_a_parent_tile_out() {
        let planes = clip_planes_for(ClipSide::Right, DVec2::new(100.0, 0.0), 64.0);
        // Boundary at x = 164, facing west: keeps x <= 164.
        assert_eq!(planes[0].normal, Vec3::NEG_X);
        assert_eq!(planes[0].constant, 164.0);
    }
}
