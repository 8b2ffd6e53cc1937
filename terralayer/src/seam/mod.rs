//! Seam stitching between independently built tile meshes.
//!
//! Adjacent tiles fetch and build their geometry independently, so their
//! shared edges disagree by up to the interpolation error of the source
//! raster. The stitchers reconcile those edges after the fact:
//!
//! - [`stitch_same_level`] walks the shared edge of two ring neighbors and
//!   merges heights symmetrically (floored average), with corner vertices
//!   copied from the authoritative side to avoid double averaging where two
//!   seams meet.
//! - [`stitch_to_parent`] conforms a fine tile's outer boundary to the
//!   coarser parent level beneath it; the parent is authoritative and the
//!   fine tile's extra vertices are interpolated between the parent's.
//!
//! Both mutate vertex and normal buffers in place and mark the meshes dirty;
//! only cross-level stitching rewrites backing height samples.

mod cross;
mod edge;
mod same_level;

pub use cross::stitch_to_parent;
pub use edge::Orientation;
pub use same_level::{stitch_same_level, SeamTile};
