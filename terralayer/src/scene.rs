//! External scene-owner interfaces.
//!
//! The terrain core builds and stitches meshes but never draws them; a
//! [`SceneSink`] implementation owns the render graph and is told whenever a
//! tile's mesh is committed or evicted. Observer position flows the other
//! way through [`ObserverPosition`].

use crate::clipmap::Tile;
use crate::geometry::TileMesh;
use glam::DVec3;

/// Receiver for committed tile rebuilds and ring evictions.
///
/// `on_tile_rebuilt` is invoked exactly once per committed (non-stale)
/// rebuild; the scene owner attaches the tile's new mesh and detaches
/// `previous`. Callbacks are synchronous and must not block.
pub trait SceneSink: Send + Sync {
    /// A tile committed a freshly built mesh.
    fn on_tile_rebuilt(&self, level_number: usize, tile: &Tile, previous: Option<TileMesh>);

    /// A tile fell off the ring's trailing edge during recentring; its mesh
    /// must leave the render graph.
    fn on_tile_evicted(&self, level_number: usize, mesh: TileMesh) {
        let _ = (level_number, mesh);
    }
}

/// A sink that drops everything. Useful for headless runs and tests that
/// only exercise the grid bookkeeping.
pub struct NullSceneSink;

impl SceneSink for NullSceneSink {
    fn on_tile_rebuilt(&self, _level_number: usize, _tile: &Tile, _previous: Option<TileMesh>) {}
}

/// Partial position write; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl PositionUpdate {
    /// Update that only sets the vertical coordinate.
    pub fn y(value: f64) -> Self {
        Self {
            y: Some(value),
            ..Self::default()
        }
    }
}

/// Accessor and mutator for the observer's world position.
///
/// The core reads the planar (x, z) position every update tick, and writes
/// once at startup: a zeroed planar position when the origin offset is
/// established, and a vertical offset from the ground probe.
pub trait ObserverPosition: Send + Sync {
    /// Current observer position in scene-local coordinates.
    fn position(&self) -> DVec3;

    /// Applies a partial position update.
    fn set_position(&self, update: PositionUpdate);
}

/// Ground probe supplied by the rendering collaborator: given the mesh under
/// the observer, returns the surface height at the observer's position, or
/// `None` when the probe ray misses.
pub type GroundProbe = dyn Fn(&TileMesh) -> Option<f64> + Send + Sync;
