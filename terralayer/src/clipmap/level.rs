//! One clipmap level: ring recentring, rebuild scheduling and cancellation.

use super::tile::{clip_planes_for, Tile, TilePos};
use crate::coord;
use crate::geometry::build_tile_mesh;
use crate::ring::{
    classify_clip_side, closest_corner, shift_row, tile_delta, Corner, SeamSide,
};
use crate::scene::SceneSink;
use crate::seam::{stitch_same_level, stitch_to_parent, SeamTile};
use crate::store::HeightStore;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use glam::DVec2;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Ring dimension. The grid is always 2×2; corner labels map one-to-one onto
/// grid slots.
const RING: usize = 2;

/// Failure of a single tile's rebuild. `Clone` because rebuild results are
/// observed through shared futures by every seam that touches the tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RebuildError {
    /// Height fetch or decode failed; the tile keeps its previous mesh and
    /// is retried on the next cycle that touches it.
    #[error("tile rebuild failed: {0}")]
    Fetch(String),
}

/// A corner rebuild in flight, awaitable by `rebuild()` and by seam tasks.
type SharedRebuild = Shared<BoxFuture<'static, Result<(), RebuildError>>>;

type TileSlot = Arc<Mutex<Tile>>;

/// One LOD ring of the clipmap.
///
/// Owns a 2×2 grid of tiles at a fixed world scale, tracks the observer's
/// tile index, and runs the asynchronous per-tile rebuild pipeline. Levels
/// are owned by the terrain root in a flat list, coarsest first; the parent
/// relationship is positional, never an owning back-pointer.
pub struct ClipmapLevel {
    number: usize,
    zoom: u8,
    tile_world_size: f64,
    half_tile: f64,
    sample_size: u32,
    /// Planar offset of the terrain origin, subtracted to keep scene
    /// coordinates small.
    offset: DVec2,
    store: Arc<HeightStore>,
    sink: Arc<dyn SceneSink>,
    /// Rebuild generation. Stale tasks observe a newer value and abandon
    /// silently; this is the only cancellation mechanism.
    generation: AtomicU64,
    /// Set once the first update pass completes; shifts are suppressed until
    /// the ring has been built at least once.
    inited: AtomicBool,
    /// Per-seam in-flight guards, indexed by [`SeamSide::index`]. A seam is
    /// stitched at most once per cycle no matter how many adjacent tiles
    /// request it.
    seam_guards: [AtomicBool; 4],
    state: Mutex<LevelState>,
}

struct LevelState {
    /// Ring origin: the tile index containing the observer.
    tile_number: (i32, i32),
    /// Physical tile grid, `tiles[row][col]`, row 0 north.
    tiles: Vec<Vec<TileSlot>>,
    /// Corner whose tile currently contains the observer-designated region.
    active_corner: Option<Corner>,
    /// Parent ring center, used to classify clip sides. `None` on the
    /// coarsest level.
    parent_anchor: Option<DVec2>,
    /// In-flight (or last) rebuild per corner, indexed by [`Corner::index`].
    rebuilds: [Option<SharedRebuild>; 4],
}

impl LevelState {
    /// The slot holding a corner's tile. Corner labels are fixed to grid
    /// slots, so this is a pure index lookup.
    fn slot(&self, corner: Corner) -> TileSlot {
        Arc::clone(&self.tiles[corner.row()][corner.col()])
    }
}

impl ClipmapLevel {
    pub(crate) fn new(
        number: usize,
        zoom: u8,
        tile_world_size: f64,
        sample_size: u32,
        offset: DVec2,
        store: Arc<HeightStore>,
        sink: Arc<dyn SceneSink>,
    ) -> Arc<Self> {
        let tiles = (0..RING)
            .map(|row| {
                (0..RING)
                    .map(|col| {
                        let corner = corner_at(row, col);
                        Arc::new(Mutex::new(Tile::empty(corner)))
                    })
                    .collect()
            })
            .collect();

        Arc::new(Self {
            number,
            zoom,
            tile_world_size,
            half_tile: tile_world_size / 2.0,
            sample_size,
            offset,
            store,
            sink,
            generation: AtomicU64::new(0),
            inited: AtomicBool::new(false),
            seam_guards: Default::default(),
            state: Mutex::new(LevelState {
                tile_number: (0, 0),
                tiles,
                active_corner: None,
                parent_anchor: None,
                rebuilds: Default::default(),
            }),
        })
    }

    /// Level index, coarsest = 0.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Zoom level this ring samples.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// World-space tile edge length at this level.
    pub fn tile_world_size(&self) -> f64 {
        self.tile_world_size
    }

    /// Current rebuild generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Current ring origin tile index.
    pub fn tile_number(&self) -> (i32, i32) {
        self.state.lock().unwrap().tile_number
    }

    /// Snapshot of the grid's tile placements, row-major.
    pub fn tile_positions(&self) -> Vec<Option<TilePos>> {
        let st = self.state.lock().unwrap();
        st.tiles
            .iter()
            .flatten()
            .map(|slot| slot.lock().unwrap().pos)
            .collect()
    }

    /// Snapshot of the grid's tile slots, row-major. Scene owners can
    /// inspect committed meshes and clip planes through the locks.
    pub fn tiles(&self) -> Vec<Arc<Mutex<Tile>>> {
        let st = self.state.lock().unwrap();
        st.tiles.iter().flatten().map(Arc::clone).collect()
    }

    /// The tile currently designated as containing the observer, if any.
    pub fn active_tile(&self) -> Option<TileSlot> {
        let st = self.state.lock().unwrap();
        st.active_corner.map(|corner| st.slot(corner))
    }

    /// Runs one update tick for this level: recenter, rebuild, conform to
    /// the parent. Returns the recentring anchor for the child level (this
    /// ring's top-left tile center plus half a tile, i.e. the ring center).
    pub(crate) async fn update(
        self: &Arc<Self>,
        observer: DVec2,
        anchor: Option<DVec2>,
        parent: Option<&Arc<ClipmapLevel>>,
    ) -> DVec2 {
        {
            let mut st = self.state.lock().unwrap();
            if anchor.is_some() {
                st.parent_anchor = anchor;
            }
            self.shift(&mut st, observer + self.offset);
        }

        self.rebuild(observer).await;
        self.inited.store(true, Ordering::SeqCst);

        // Same-level seam tasks run detached; let them settle before the
        // cross-level pass so a late seam write cannot undo a conformed
        // boundary vertex.
        self.drain_seams().await;

        if let Some(parent) = parent {
            self.conform_to_parent(parent, self.generation.load(Ordering::SeqCst));
        }

        self.child_anchor()
    }

    /// Waits until no seam stitch is in flight. Rebuild commits have already
    /// resolved by the time this runs, so no new seam can be triggered while
    /// waiting.
    async fn drain_seams(&self) {
        while self.seam_guards.iter().any(|g| g.load(Ordering::SeqCst)) {
            tokio::task::yield_now().await;
        }
    }

    /// Recenters the ring on the observer's tile index, circularly shifting
    /// the grid and evicting tiles that fall off the trailing edge.
    ///
    /// Movement is assumed to never exceed one tile per tick; that is a
    /// documented precondition of the caller, not a defended invariant.
    fn shift(&self, st: &mut LevelState, absolute: DVec2) {
        let (nx, nz) = coord::tile_index(absolute, self.tile_world_size);
        let mut dx = 0;
        let mut dz = 0;

        if self.inited.load(Ordering::SeqCst) && st.tile_number != (nx, nz) {
            dx = nx - st.tile_number.0;
            dz = nz - st.tile_number.1;
        }
        st.tile_number = (nx, nz);

        if dx == 0 && dz == 0 {
            return;
        }
        debug!(level = self.number, nx, nz, dx, dz, "recentring ring");

        if dx != 0 {
            for row in &mut st.tiles {
                let evicted = shift_row(row, dx, fresh_slot());
                self.evict(evicted);
            }
        }
        if dz != 0 {
            let fresh = (0..RING).map(|_| fresh_slot()).collect();
            let evicted_row = shift_row(&mut st.tiles, dz, fresh);
            for evicted in evicted_row {
                self.evict(evicted);
            }
        }

        // Tiles moved slots; re-pin corner labels to grid positions.
        for (row, slots) in st.tiles.iter().enumerate() {
            for (col, slot) in slots.iter().enumerate() {
                slot.lock().unwrap().corner = corner_at(row, col);
            }
        }

        // The ring now holds unbuilt tiles; the same-corner short-circuit
        // must not skip this cycle's rebuild.
        st.active_corner = None;
    }

    fn evict(&self, slot: TileSlot) {
        if let Some(mesh) = slot.lock().unwrap().mesh.take() {
            trace!(level = self.number, "evicting trailing-edge tile");
            self.sink.on_tile_evicted(self.number, mesh);
        }
    }

    /// Determines the active corner and, when it changed, mints a new
    /// generation and launches the four concurrent corner rebuilds. When the
    /// observer stayed in the same relative region, only the clip
    /// classification is refreshed and no rebuild is issued.
    async fn rebuild(self: &Arc<Self>, observer: DVec2) {
        let pending: Vec<SharedRebuild> = {
            let mut st = self.state.lock().unwrap();
            let center = self.tile_pos(st.tile_number, 0, 0);
            let corner = closest_corner(observer, center.center(), self.half_tile);

            if st.active_corner == Some(corner) {
                self.reclassify(&mut st);
                return;
            }

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(level = self.number, ?corner, generation, "rebuilding ring");
            st.active_corner = Some(corner);

            for target in Corner::ALL {
                let (dz, dx) = tile_delta(corner, target);
                let pos = self.tile_pos(st.tile_number, dz, dx);
                let slot = st.slot(target);
                {
                    let mut tile = slot.lock().unwrap();
                    tile.pos = Some(pos);
                    classify_tile(&mut tile, st.parent_anchor, self.tile_world_size);
                }

                let task = Arc::clone(self)
                    .rebuild_tile(generation, target, pos)
                    .boxed()
                    .shared();
                st.rebuilds[target.index()] = Some(task.clone());
                // Drive to completion even if no awaiter survives.
                tokio::spawn(task);
            }

            st.rebuilds.iter().flatten().cloned().collect()
        };

        for task in pending {
            let _ = task.await;
        }
    }

    /// Rebuilds one corner's tile: fetch samples, check the generation,
    /// build and swap the mesh, notify the scene, trigger adjacent seams.
    async fn rebuild_tile(
        self: Arc<Self>,
        generation: u64,
        corner: Corner,
        pos: TilePos,
    ) -> Result<(), RebuildError> {
        let samples = self
            .store
            .get_tile(pos.nx, pos.nz, self.zoom, self.sample_size)
            .await
            .map_err(|e| {
                warn!(
                    level = self.number,
                    nx = pos.nx,
                    nz = pos.nz,
                    error = %e,
                    "tile rebuild failed; keeping previous mesh"
                );
                RebuildError::Fetch(e.to_string())
            })?;

        // Resume point: anything after the fetch is generation-checked.
        if self.generation.load(Ordering::SeqCst) != generation {
            trace!(level = self.number, generation, "rebuild superseded");
            return Ok(());
        }

        let mesh = build_tile_mesh(&samples, self.tile_world_size, pos.center());

        let slot = {
            let st = self.state.lock().unwrap();
            st.slot(corner)
        };
        let previous = {
            let mut tile = slot.lock().unwrap();
            tile.heights = samples.to_vec();
            tile.mesh.replace(mesh)
        };
        {
            let tile = slot.lock().unwrap();
            self.sink.on_tile_rebuilt(self.number, &tile, previous);
        }
        trace!(level = self.number, ?corner, generation, "tile committed");

        for seam in corner.seams() {
            self.trigger_seam(generation, seam);
        }

        Ok(())
    }

    /// Queues a seam stitch once its two adjacent tile rebuilds resolve.
    /// The per-seam guard ensures one stitch attempt per cycle even though
    /// both adjacent tiles request the seam.
    fn trigger_seam(self: &Arc<Self>, generation: u64, seam: SeamSide) {
        if self.seam_guards[seam.index()].swap(true, Ordering::SeqCst) {
            return;
        }

        let level = Arc::clone(self);
        tokio::spawn(async move {
            level.stitch_seam(generation, seam).await;
            level.seam_guards[seam.index()].store(false, Ordering::SeqCst);
        });
    }

    async fn stitch_seam(&self, generation: u64, seam: SeamSide) {
        let [corner_a, corner_b] = seam.tiles();

        let deps: Vec<SharedRebuild> = {
            let st = self.state.lock().unwrap();
            [corner_a, corner_b]
                .iter()
                .filter_map(|c| st.rebuilds[c.index()].clone())
                .collect()
        };
        for dep in deps {
            if dep.await.is_err() {
                // One side failed to rebuild; leave the seam for the retry
                // cycle.
                return;
            }
        }

        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        let (slot_a, slot_b) = {
            let st = self.state.lock().unwrap();
            (st.slot(corner_a), st.slot(corner_b))
        };
        // Lock order follows the seam table's fixed corner order, which is
        // globally consistent across seams.
        let mut tile_a = slot_a.lock().unwrap();
        let mut tile_b = slot_b.lock().unwrap();
        let Tile {
            mesh: mesh_a,
            heights: heights_a,
            corner: label_a,
            ..
        } = &mut *tile_a;
        let Tile {
            mesh: mesh_b,
            heights: heights_b,
            corner: label_b,
            ..
        } = &mut *tile_b;
        let (Some(mesh_a), Some(mesh_b)) = (mesh_a.as_mut(), mesh_b.as_mut()) else {
            return;
        };

        let stitched = stitch_same_level(
            SeamTile {
                mesh: mesh_a,
                heights: heights_a,
                corner: *label_a,
            },
            SeamTile {
                mesh: mesh_b,
                heights: heights_b,
                corner: *label_b,
            },
        );
        if stitched {
            trace!(level = self.number, ?seam, generation, "seam stitched");
        }
    }

    /// Conforms this ring's boundary tiles to the parent level's meshes.
    /// Edge clip sides only; diagonal corners are left unstitched. Stops as
    /// soon as a newer generation supersedes the tick that requested it.
    fn conform_to_parent(&self, parent: &ClipmapLevel, generation: u64) {
        let slots: Vec<TileSlot> = {
            let st = self.state.lock().unwrap();
            st.tiles.iter().flatten().map(Arc::clone).collect()
        };

        for slot in slots {
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            let (side, pos) = {
                let tile = slot.lock().unwrap();
                (tile.clip_side, tile.pos)
            };
            let (Some(side), Some(pos)) = (side, pos) else {
                continue;
            };
            if !side.is_edge() {
                continue;
            }
            let Some(parent_slot) = parent.tile_containing(pos.center()) else {
                continue;
            };

            let mut fine = slot.lock().unwrap();
            let parent_tile = parent_slot.lock().unwrap();
            let Some(parent_mesh) = &parent_tile.mesh else {
                continue;
            };
            let Tile { mesh, heights, .. } = &mut *fine;
            let Some(fine_mesh) = mesh.as_mut() else {
                continue;
            };

            if stitch_to_parent(fine_mesh, heights, parent_mesh, side) {
                trace!(level = self.number, ?side, "conformed boundary to parent");
            }
        }
    }

    /// The tile whose footprint contains a world point, if any.
    fn tile_containing(&self, point: DVec2) -> Option<TileSlot> {
        let st = self.state.lock().unwrap();
        for slot in st.tiles.iter().flatten() {
            let tile = slot.lock().unwrap();
            if let Some(pos) = &tile.pos {
                if (point.x - pos.x).abs() <= self.half_tile
                    && (point.y - pos.z).abs() <= self.half_tile
                {
                    drop(tile);
                    return Some(Arc::clone(slot));
                }
            }
        }
        None
    }

    /// Refreshes clip sides and planes without rebuilding, for the
    /// same-corner short-circuit (the parent anchor may still have moved).
    fn reclassify(&self, st: &mut LevelState) {
        let anchor = st.parent_anchor;
        for slot in st.tiles.iter().flatten() {
            let mut tile = slot.lock().unwrap();
            classify_tile(&mut tile, anchor, self.tile_world_size);
        }
    }

    /// World placement of the tile at `(dz, dx)` from the ring origin.
    fn tile_pos(&self, tile_number: (i32, i32), dz: i32, dx: i32) -> TilePos {
        let nx = tile_number.0 + dx;
        let nz = tile_number.1 + dz;
        TilePos {
            nx,
            nz,
            x: nx as f64 * self.tile_world_size - self.offset.x + self.half_tile,
            z: nz as f64 * self.tile_world_size - self.offset.y + self.half_tile,
        }
    }

    /// Recentring anchor for the child level: this ring's center point.
    fn child_anchor(&self) -> DVec2 {
        let st = self.state.lock().unwrap();
        let top_left = st.tiles[0][0].lock().unwrap();
        match &top_left.pos {
            Some(pos) => DVec2::new(pos.x + self.half_tile, pos.z + self.half_tile),
            None => {
                let center = self.tile_pos(st.tile_number, 0, 0);
                DVec2::new(center.x + self.half_tile, center.z + self.half_tile)
            }
        }
    }
}

fn fresh_slot() -> TileSlot {
    // Corner label is re-pinned after the shift completes.
    Arc::new(Mutex::new(Tile::empty(Corner::TopLeft)))
}

fn corner_at(row: usize, col: usize) -> Corner {
    match (row, col) {
        (0, 0) => Corner::TopLeft,
        (0, 1) => Corner::TopRight,
        (1, 0) => Corner::BottomLeft,
        (1, 1) => Corner::BottomRight,
        _ => unreachable!("ring is 2x2"),
    }
}

/// Classifies a tile against the parent ring center and derives its clip
/// planes. Clears both when the level has no parent anchor yet.
fn classify_tile(tile: &mut Tile, anchor: Option<DVec2>, half_parent: f64) {
    match (anchor, tile.pos) {
        (Some(anchor), Some(pos)) => {
            let side = classify_clip_side(pos.center(), anchor, half_parent);
            tile.clip_side = Some(side);
            tile.clip_planes = clip_planes_for(side, pos.center(), half_parent);
        }
        _ => {
            tile.clip_side = None;
            tile.clip_planes.clear();
        }
    }
}
