//! Grid mesh construction from height samples.
//!
//! Builds one square terrain patch per tile: an `n × n` vertex grid on the XZ
//! plane, translated to the tile's world center, with the height sample at
//! row-major index `row * n + col` driving the vertex at the same index.
//! Row 0 is the north (−z) edge. Triangles wind counter-clockwise viewed from
//! +Y; vertex normals are accumulated from face normals after heights are
//! applied.

use glam::{DVec2, Vec3};

/// A built tile mesh: positions, normals and a triangle-list index buffer.
///
/// Owned exclusively by its tile and replaced wholesale on rebuild. The seam
/// stitchers are the only code that mutates a committed mesh in place; they
/// set `dirty` so the scene owner knows to re-upload the vertex buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMesh {
    /// Segments per side (vertices per side minus one).
    pub segments: u32,
    /// World-space edge length of the patch.
    pub world_size: f32,
    /// Vertex positions, row-major, rows north to south.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, same layout as `positions`.
    pub normals: Vec<Vec3>,
    /// Triangle-list indices, CCW from +Y.
    pub indices: Vec<u32>,
    /// Set by the seam stitchers after in-place vertex edits.
    pub dirty: bool,
}

impl TileMesh {
    /// Vertices per side.
    #[inline]
    pub fn side(&self) -> usize {
        self.segments as usize + 1
    }

    /// Height (y) of the vertex at `(row, col)`.
    #[inline]
    pub fn height_at(&self, row: usize, col: usize) -> f32 {
        self.positions[row * self.side() + col].y
    }
}

/// Builds a tile mesh from a square height-sample array.
///
/// `heights` must have a square length (`n²`); `n − 1` becomes the segment
/// count. Non-finite samples leave their vertex at height zero rather than
/// propagating into the normal math. `center` is the tile's world-space
/// center on the horizontal plane.
pub fn build_tile_mesh(heights: &[f32], world_size: f64, center: DVec2) -> TileMesh {
    let n = (heights.len() as f64).sqrt() as usize;
    debug_assert_eq!(n * n, heights.len(), "height array must be square");
    debug_assert!(n >= 2, "a tile needs at least one segment");

    let step = world_size / (n - 1) as f64;
    let origin_x = center.x - world_size / 2.0;
    let origin_z = center.y - world_size / 2.0;

    let mut positions = Vec::with_capacity(n * n);
    for row in 0..n {
        let z = origin_z + row as f64 * step;
        for col in 0..n {
            let x = origin_x + col as f64 * step;
            let h = heights[row * n + col];
            let y = if h.is_finite() { h } else { 0.0 };
            positions.push(Vec3::new(x as f32, y, z as f32));
        }
    }

    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for row in 0..n - 1 {
        for col in 0..n - 1 {
            let i0 = (row * n + col) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + n as u32;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    let normals = vertex_normals(&positions, &indices);

    TileMesh {
        segments: (n - 1) as u32,
        world_size: world_size as f32,
        positions,
        normals,
        indices,
        dirty: false,
    }
}

/// Accumulates area-weighted face normals into per-vertex normals.
fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_grid_has_up_normals() {
        let heights = vec![0.0; 9];
        let mesh = build_tile_mesh(&heights, 2.0, DVec2::ZERO);

        assert_eq!(mesh.segments, 2);
        assert_eq!(mesh.positions.len(), 9);
        assert_eq!(mesh.indices.len(), 24);
        for normal in &mesh.normals {
            assert!((*normal - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_sample_maps_to_matching_vertex() {
        let mut heights = vec![0.0; 9];
        heights[1 * 3 + 2] = 42.0; // row 1, col 2
        let mesh = build_tile_mesh(&heights, 2.0, DVec2::ZERO);

        assert_eq!(mesh.height_at(1, 2), 42.0);
        assert_eq!(mesh.height_at(2, 1), 0.0);
    }

    #[test]
    fn test_grid_spans_world_size_around_center() {
        let heights = vec![0.0; 9];
        let mesh = build_tile_mesh(&heights, 4.0, DVec2::new(10.0, 20.0));

        let first = mesh.positions[0];
        let last = mesh.positions[8];
        assert_eq!((first.x, first.z), (8.0, 18.0));
        assert_eq!((last.x, last.z), (12.0, 22.0));
    }

    #[test]
    fn test_non_finite_samples_fall_back_to_zero() {
        let mut heights = vec![1.0; 9];
        heights[4] = f32::NAN;
        let mesh = build_tile_mesh(&heights, 2.0, DVec2::ZERO);

        assert_eq!(mesh.height_at(1, 1), 0.0);
        assert!(mesh.normals.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn test_row_zero_is_north_edge() {
        let heights = vec![0.0; 9];
        let mesh = build_tile_mesh(&heights, 2.0, DVec2::ZERO);

        assert!(mesh.positions[0].z < mesh.positions[8].z);
    }
}
