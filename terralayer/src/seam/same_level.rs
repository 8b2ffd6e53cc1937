//! Same-level seam stitching.

use super::edge::Orientation;
use crate::geometry::TileMesh;
use crate::ring::Corner;
use tracing::trace;

/// One side of a seam: a tile's mesh, its raw height samples and its ring
/// corner label.
///
/// The height samples are read-only here — same-level stitching reconciles
/// the meshes but never rewrites the backing sample arrays.
pub struct SeamTile<'a> {
    pub mesh: &'a mut TileMesh,
    pub heights: &'a [f32],
    pub corner: Corner,
}

/// Reconciles vertex heights and normals along the shared edge of two
/// adjacent tiles at the same level.
///
/// - Corner vertices: A's value is copied onto B verbatim. Corners are never
///   averaged, so a corner touched by two seams is not averaged twice.
/// - Interior vertices: both sides are set to `floor((raw_a + raw_b) / 2)`
///   computed from the tiles' independently fetched raw samples.
/// - Normals: copied from A onto B along the whole edge.
///
/// When A is built at a finer vertex resolution than B (legacy mixed-
/// resolution seams), A's intermediate edge vertices are linearly
/// interpolated between consecutive matched points after the merge.
///
/// Returns `false` without touching either mesh when the tiles are not edge
/// neighbors or their resolutions do not divide evenly.
pub fn stitch_same_level(a: SeamTile<'_>, b: SeamTile<'_>) -> bool {
    let Some(orientation) = Orientation::between(a.corner, b.corner) else {
        return false;
    };

    let na = a.mesh.side();
    let nb = b.mesh.side();
    if nb < 2 || (na - 1) % (nb - 1) != 0 {
        return false;
    }
    let ratio = (na - 1) / (nb - 1);

    trace!(?orientation, na, nb, ratio, "stitching same-level seam");

    let ia = |i: usize| orientation.index_a(na, i);
    let ib = |i: usize| orientation.index_b(nb, i);

    // Corner vertices: A is authoritative.
    a_to_b(a.mesh, b.mesh, ia(0), ib(0));
    a_to_b(a.mesh, b.mesh, ia((nb - 1) * ratio), ib(nb - 1));

    // Interior vertices: floored average of the raw samples on both sides.
    for i in 1..nb - 1 {
        let idx_a = ia(i * ratio);
        let idx_b = ib(i);
        let merged = ((a.heights[idx_a] + b.heights[idx_b]) / 2.0).floor();
        a.mesh.positions[idx_a].y = merged;
        b.mesh.positions[idx_b].y = merged;
    }

    // Align A's intermediate edge vertices once the matched points are final.
    if ratio > 1 {
        for seg in 0..nb - 1 {
            let first = a.mesh.positions[ia(seg * ratio)].y;
            let last = a.mesh.positions[ia((seg + 1) * ratio)].y;
            for j in 1..ratio {
                let t = j as f32 / ratio as f32;
                a.mesh.positions[ia(seg * ratio + j)].y = first + (last - first) * t;
            }
        }
    }

    // Normals: B conforms to A along the edge.
    for i in 0..nb {
        b.mesh.normals[ib(i)] = a.mesh.normals[ia(i * ratio)];
    }

    a.mesh.dirty = true;
    b.mesh.dirty = true;
    true
}

#[inline]
fn a_to_b(a: &TileMesh, b: &mut TileMesh, idx_a: usize, idx_b: usize) {
    b.positions[idx_b].y = a.positions[idx_a].y;
}
