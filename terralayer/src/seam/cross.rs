//! Cross-level seam stitching: a fine tile conforming to its parent.

use crate::geometry::TileMesh;
use crate::ring::ClipSide;
use tracing::trace;

/// Stitches a fine tile's boundary edge to the coarser parent tile beneath
/// it. The parent is authoritative: its vertex heights and normals are copied
/// onto the fine tile's coarse-aligned boundary vertices (every second
/// vertex, since the parent's vertex stride is twice the fine tile's), and
/// the fine in-between vertices are linearly interpolated between each pair
/// of newly set neighbors.
///
/// Unlike same-level stitching this overwrites the fine tile's backing
/// boundary samples too, so later same-level seams on the fine ring agree
/// with the parent.
///
/// Only edge clip sides are stitched; diagonal sides return `false` and
/// leave everything untouched (corner reconciliation is an open gap). Also
/// returns `false` when the two meshes disagree on resolution or the fine
/// boundary does not land on the parent's vertex grid.
pub fn stitch_to_parent(
    fine_mesh: &mut TileMesh,
    fine_heights: &mut [f32],
    parent: &TileMesh,
    side: ClipSide,
) -> bool {
    if !side.is_edge() {
        return false;
    }

    let n = fine_mesh.side();
    if parent.side() != n || n < 3 || n % 2 == 0 || fine_heights.len() != n * n {
        return false;
    }

    let edge_index = |i: usize| -> usize {
        match side {
            ClipSide::Top => i,
            ClipSide::Bottom => (n - 1) * n + i,
            ClipSide::Left => i * n,
            ClipSide::Right => i * n + (n - 1),
            _ => unreachable!("edge sides only"),
        }
    };

    let parent_origin = parent.positions[0];
    let step = parent.world_size / (n - 1) as f32;

    // First pass: coarse-aligned vertices copy the parent verbatim.
    for i in (0..n).step_by(2) {
        let idx = edge_index(i);
        let world = fine_mesh.positions[idx];
        let col = ((world.x - parent_origin.x) / step).round() as i64;
        let row = ((world.z - parent_origin.z) / step).round() as i64;
        if !(0..n as i64).contains(&col) || !(0..n as i64).contains(&row) {
            trace!(?side, i, col, row, "fine boundary outside parent tile");
            return false;
        }

        let parent_idx = row as usize * n + col as usize;
        let height = parent.positions[parent_idx].y;
        fine_mesh.positions[idx].y = height;
        fine_mesh.normals[idx] = parent.normals[parent_idx];
        fine_heights[idx] = height;
    }

    // Second pass: in-between vertices on the line between their neighbors.
    for i in (1..n - 1).step_by(2) {
        let prev = edge_index(i - 1);
        let next = edge_index(i + 1);
        let idx = edge_index(i);
        let height = (fine_mesh.positions[prev].y + fine_mesh.positions[next].y) / 2.0;
        fine_mesh.positions[idx].y = height;
        fine_mesh.normals[idx] =
            (fine_mesh.normals[prev] + fine_mesh.normals[next]).normalize_or_zero();
        fine_heights[idx] = height;
    }

    fine_mesh.dirty = true;
    true
}
