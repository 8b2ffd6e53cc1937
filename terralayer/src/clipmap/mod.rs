//! Clipmap terrain: a chain of concentric LOD rings around an observer.
//!
//! A [`Terrain`] owns one [`ClipmapLevel`] per zoom in the configured range,
//! coarsest first. Every level is a 2×2 ring of tiles whose world size halves
//! from one level to the next, so the chain renders fine geometry near the
//! observer and progressively coarser geometry further out. Each update tick
//! recenters every ring on the observer and rebuilds the tiles whose content
//! changed; rebuilds are asynchronous and a newer tick silently cancels any
//! still in flight.

mod level;
mod tile;

pub use level::{ClipmapLevel, RebuildError};
pub use tile::{clip_planes_for, ClipPlane, Tile, TilePos};

use crate::config::{ConfigError, Origin, TerrainConfig};
use crate::coord::{self, CoordError};
use crate::provider::HeightTileProvider;
use crate::scene::{GroundProbe, ObserverPosition, PositionUpdate, SceneSink};
use crate::store::HeightStore;
use glam::DVec2;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Fatal terrain construction errors.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// The terrain root: level chain, shared height store, planar origin.
///
/// Cheap to share behind an `Arc`; [`Terrain::update`] takes `&self` so
/// overlapping ticks from different tasks are permitted (a newer tick's
/// generation supersedes the older one's rebuilds per level).
pub struct Terrain {
    config: TerrainConfig,
    /// Planar position of the configured origin at the finest zoom. Scene
    /// coordinates are planar coordinates minus this offset, keeping them
    /// small enough for f32 mesh vertices.
    offset: DVec2,
    levels: Vec<Arc<ClipmapLevel>>,
    store: Arc<HeightStore>,
}

impl Terrain {
    /// Builds the level chain from a validated configuration.
    ///
    /// One level per zoom in `min_zoom..=max_zoom`, coarsest first, with the
    /// tile world size doubling per zoom step away from the finest level.
    pub fn new(
        config: TerrainConfig,
        provider: Arc<dyn HeightTileProvider>,
        sink: Arc<dyn SceneSink>,
    ) -> Result<Self, TerrainError> {
        let origin = config.validate()?;

        let offset = match origin {
            Origin::Planar(planar) => planar,
            Origin::Geodetic(geo) => {
                coord::geo_to_planar(geo, config.max_zoom, config.tile_resolution)?
            }
        };

        let store = Arc::new(HeightStore::new(
            Arc::clone(&provider),
            config.amplitude,
            config.height_offset,
        ));

        let sample_size = config.sample_size();
        let levels = (0..config.level_count())
            .map(|i| {
                let zoom = config.min_zoom + i as u8;
                let scale = 1u32 << (config.max_zoom - zoom);
                let tile_world = config.tile_size * scale as f64;
                ClipmapLevel::new(
                    i,
                    zoom,
                    tile_world,
                    sample_size,
                    offset,
                    Arc::clone(&store),
                    Arc::clone(&sink),
                )
            })
            .collect();

        info!(
            levels = config.level_count(),
            min_zoom = config.min_zoom,
            max_zoom = config.max_zoom,
            offset_x = offset.x,
            offset_z = offset.y,
            "terrain constructed"
        );

        Ok(Self {
            config,
            offset,
            levels,
            store,
        })
    }

    /// The level chain, coarsest first.
    pub fn levels(&self) -> &[Arc<ClipmapLevel>] {
        &self.levels
    }

    /// The shared height store (exposed for cache statistics).
    pub fn store(&self) -> &Arc<HeightStore> {
        &self.store
    }

    /// Planar origin offset at the finest zoom.
    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    /// Runs one update tick for the whole chain at the observer's horizontal
    /// scene position.
    ///
    /// Levels update coarsest to finest; each level hands its ring center
    /// down as the next level's parent anchor so clip classification and
    /// cross-level stitching see a consistent snapshot. The call resolves
    /// when every non-superseded rebuild of this tick has committed.
    pub async fn update(&self, observer: DVec2) {
        let mut anchor: Option<DVec2> = None;
        let mut parent: Option<&Arc<ClipmapLevel>> = None;

        for level in &self.levels {
            let next = level.update(observer, anchor, parent).await;
            anchor = Some(next);
            parent = Some(level);
        }
    }

    /// Runs one update tick at the observer's current position, read from
    /// the accessor. Per-tick callers use this; [`Terrain::update`] remains
    /// for callers that already hold a planar position.
    pub async fn update_from(&self, observer: &dyn ObserverPosition) {
        let position = observer.position();
        self.update(DVec2::new(position.x, position.z)).await;
    }

    /// Startup sequence: pins the observer's horizontal position onto the
    /// origin, runs the first full update, and (when a ground probe is
    /// supplied) lifts the observer to the terrain surface.
    pub async fn start(&self, observer: &dyn ObserverPosition, probe: Option<&GroundProbe>) {
        observer.set_position(PositionUpdate {
            x: Some(0.0),
            z: Some(0.0),
            ..PositionUpdate::default()
        });

        self.update_from(observer).await;

        if let Some(probe) = probe {
            if let Some(height) = self.probe_ground(probe) {
                debug!(height, "observer lifted to terrain surface");
                observer.set_position(PositionUpdate::y(height));
            }
        }
    }

    /// Probes the finest level's active tile for the surface height under
    /// the origin.
    fn probe_ground(&self, probe: &GroundProbe) -> Option<f64> {
        let finest = self.levels.last()?;
        let slot = finest.active_tile()?;
        let tile = slot.lock().unwrap();
        let mesh = tile.mesh.as_ref()?;
        probe(mesh)
    }

    /// The configuration this terrain was built from.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }
}
