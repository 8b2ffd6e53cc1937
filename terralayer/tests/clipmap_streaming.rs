//! End-to-end streaming behavior of the clipmap chain against a mock
//! heightmap service: ring construction, stationary idempotence, recentring,
//! stale-rebuild abandonment and the startup sequence.

use futures::future::BoxFuture;
use futures::FutureExt;
use glam::{DVec2, DVec3};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex};
use terralayer::clipmap::{Terrain, Tile};
use terralayer::config::{Origin, TerrainConfig};
use terralayer::geometry::TileMesh;
use terralayer::provider::{HeightTileProvider, ProviderError};
use terralayer::ring::ClipSide;
use terralayer::scene::{GroundProbe, ObserverPosition, PositionUpdate, SceneSink};
use tokio::sync::watch;

/// PNG raster of a single terrain-rgb color, `px` pixels square.
fn raster(px: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
    let image = RgbaImage::from_pixel(px, px, Rgba([r, g, b, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encode");
    bytes
}

/// Provider serving the same raster for every tile, counting fetches.
struct ConstProvider {
    raster: Vec<u8>,
    fetches: AtomicUsize,
}

impl ConstProvider {
    fn new(raster: Vec<u8>) -> Self {
        Self {
            raster,
            fetches: AtomicUsize::new(0),
        }
    }
}

impl HeightTileProvider for ConstProvider {
    fn fetch(&self, _x: i32, _z: i32, _zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let raster = self.raster.clone();
        async move { Ok(raster) }.boxed()
    }

    fn name(&self) -> &str {
        "const"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        22
    }
}

/// Provider whose fetches all park until the gate opens.
struct GatedProvider {
    raster: Vec<u8>,
    gate: watch::Receiver<bool>,
}

impl HeightTileProvider for GatedProvider {
    fn fetch(&self, _x: i32, _z: i32, _zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        let mut gate = self.gate.clone();
        let raster = self.raster.clone();
        async move {
            let _ = gate.wait_for(|open| *open).await;
            Ok(raster)
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "gated"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        22
    }
}

/// Provider that can be switched into a failing state mid-test.
struct FlakyProvider {
    raster: Vec<u8>,
    failing: AtomicBool,
}

impl FlakyProvider {
    fn new(raster: Vec<u8>) -> Self {
        Self {
            raster,
            failing: AtomicBool::new(false),
        }
    }
}

impl HeightTileProvider for FlakyProvider {
    fn fetch(&self, _x: i32, _z: i32, _zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        let failing = self.failing.load(Ordering::SeqCst);
        let raster = self.raster.clone();
        async move {
            if failing {
                Err(ProviderError::Status(503))
            } else {
                Ok(raster)
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "flaky"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        22
    }
}

/// Provider whose raster color encodes the requested zoom, so every level
/// decodes to a distinct constant height.
struct ZoomTintProvider;

impl HeightTileProvider for ZoomTintProvider {
    fn fetch(&self, _x: i32, _z: i32, zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        let bytes = raster(16, 0, zoom, 0);
        async move { Ok(bytes) }.boxed()
    }

    fn name(&self) -> &str {
        "zoom-tint"
    }

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        22
    }
}

#[derive(Clone, Debug, PartialEq)]
struct RebuiltRecord {
    level: usize,
    nx: i32,
    nz: i32,
    clip_side: Option<ClipSide>,
    mesh: TileMesh,
    replaced_previous: bool,
}

/// Sink recording every commit and eviction.
#[derive(Default)]
struct RecordingSink {
    rebuilt: Mutex<Vec<RebuiltRecord>>,
    evictions: Mutex<Vec<usize>>,
}

impl RecordingSink {
    fn rebuilt(&self) -> Vec<RebuiltRecord> {
        self.rebuilt.lock().unwrap().clone()
    }

    fn eviction_count(&self) -> usize {
        self.evictions.lock().unwrap().len()
    }
}

impl SceneSink for RecordingSink {
    fn on_tile_rebuilt(&self, level_number: usize, tile: &Tile, previous: Option<TileMesh>) {
        let pos = tile.pos.expect("committed tiles are placed");
        let mesh = tile.mesh.as_ref().expect("committed tiles have a mesh");
        self.rebuilt.lock().unwrap().push(RebuiltRecord {
            level: level_number,
            nx: pos.nx,
            nz: pos.nz,
            clip_side: tile.clip_side,
            mesh: mesh.clone(),
            replaced_previous: previous.is_some(),
        });
    }

    fn on_tile_evicted(&self, level_number: usize, _mesh: TileMesh) {
        self.evictions.lock().unwrap().push(level_number);
    }
}

/// Single-level config over a tiny raster: 16 px tiles, 4 segments per mesh.
fn single_level_config() -> TerrainConfig {
    TerrainConfig {
        origin: Some(Origin::Planar(DVec2::ZERO)),
        min_zoom: 10,
        max_zoom: 10,
        tile_resolution: 16,
        detail_scale: 0.25,
        ..TerrainConfig::default()
    }
}

fn ring_set(records: &[RebuiltRecord], level: usize) -> HashSet<(i32, i32)> {
    records
        .iter()
        .filter(|r| r.level == level)
        .map(|r| (r.nx, r.nz))
        .collect()
}

#[tokio::test]
async fn test_first_update_builds_the_full_ring() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink.clone()).unwrap();

    terrain.update(DVec2::new(10.0, 10.0)).await;

    let records = sink.rebuilt();
    assert_eq!(records.len(), 4);
    // Observer in the north-west of tile (0, 0): the ring extends south-east.
    assert_eq!(
        ring_set(&records, 0),
        HashSet::from([(0, 0), (1, 0), (0, 1), (1, 1)])
    );
    assert!(records.iter().all(|r| !r.replaced_previous));
}

#[tokio::test]
async fn test_stationary_observer_triggers_no_rebuild() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider.clone(), sink.clone()).unwrap();

    let observer = DVec2::new(10.0, 10.0);
    terrain.update(observer).await;
    let commits = sink.rebuilt().len();
    let generation = terrain.levels()[0].generation();
    let fetches = provider.fetches.load(Ordering::SeqCst);

    terrain.update(observer).await;

    assert_eq!(sink.rebuilt().len(), commits);
    assert_eq!(terrain.levels()[0].generation(), generation);
    assert_eq!(provider.fetches.load(Ordering::SeqCst), fetches);
}

#[tokio::test]
async fn test_crossing_a_tile_boundary_shifts_the_ring() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink.clone()).unwrap();
    let level = &terrain.levels()[0];

    terrain.update(DVec2::new(10.0, 10.0)).await;
    assert_eq!(level.tile_number(), (0, 0));
    let before = sink.rebuilt().len();

    // One tile east, still in the tile's north-west region.
    terrain.update(DVec2::new(266.0, 10.0)).await;

    assert_eq!(level.tile_number(), (1, 0));
    // The two west-column tiles fell off the trailing edge.
    assert_eq!(sink.eviction_count(), 2);
    let after: Vec<_> = sink.rebuilt()[before..].to_vec();
    assert_eq!(
        ring_set(&after, 0),
        HashSet::from([(1, 0), (2, 0), (1, 1), (2, 1)])
    );
}

#[tokio::test]
async fn test_constant_raster_builds_a_flat_surface() {
    // G = 1 decodes to floor(256 * 0.04) = 10.
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink.clone()).unwrap();

    terrain.update(DVec2::ZERO).await;

    let records = sink.rebuilt();
    assert!(!records.is_empty());
    for record in &records {
        for position in &record.mesh.positions {
            assert_eq!(position.y, 10.0);
        }
    }
}

#[tokio::test]
async fn test_finest_level_tiles_are_classified_against_parent() {
    let config = TerrainConfig {
        min_zoom: 9,
        max_zoom: 10,
        ..single_level_config()
    };
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(config, provider, sink.clone()).unwrap();

    terrain.update(DVec2::new(10.0, 10.0)).await;

    let records = sink.rebuilt();
    assert_eq!(records.len(), 8);
    // Coarsest ring has no parent to classify against.
    assert!(records
        .iter()
        .filter(|r| r.level == 0)
        .all(|r| r.clip_side.is_none()));
    assert!(records
        .iter()
        .filter(|r| r.level == 1)
        .all(|r| r.clip_side.is_some()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_superseded_rebuilds_never_commit() {
    let (open, gate) = watch::channel(false);
    let provider = Arc::new(GatedProvider {
        raster: raster(16, 0, 1, 0),
        gate,
    });
    let sink = Arc::new(RecordingSink::default());
    let terrain = Arc::new(Terrain::new(single_level_config(), provider, sink.clone()).unwrap());

    // First tick: observer in the tile's north-west. Its fetches park at the
    // gate.
    let first = {
        let terrain = Arc::clone(&terrain);
        tokio::spawn(async move { terrain.update(DVec2::new(10.0, 10.0)).await })
    };
    while terrain.levels()[0].generation() == 0 {
        tokio::task::yield_now().await;
    }

    // Second tick: same tile, south-east region. Mints a newer generation
    // while the first tick's fetches are still parked.
    let second = {
        let terrain = Arc::clone(&terrain);
        tokio::spawn(async move { terrain.update(DVec2::new(250.0, 250.0)).await })
    };
    while terrain.levels()[0].generation() < 2 {
        tokio::task::yield_now().await;
    }

    open.send(true).unwrap();
    first.await.unwrap();
    second.await.unwrap();

    // Only the newer tick's ring ever reached the scene.
    let records = sink.rebuilt();
    assert_eq!(records.len(), 4);
    assert_eq!(
        ring_set(&records, 0),
        HashSet::from([(-1, -1), (0, -1), (-1, 0), (0, 0)])
    );
}

struct TestObserver {
    position: Mutex<DVec3>,
}

impl ObserverPosition for TestObserver {
    fn position(&self) -> DVec3 {
        *self.position.lock().unwrap()
    }

    fn set_position(&self, update: PositionUpdate) {
        let mut position = self.position.lock().unwrap();
        if let Some(x) = update.x {
            position.x = x;
        }
        if let Some(y) = update.y {
            position.y = y;
        }
        if let Some(z) = update.z {
            position.z = z;
        }
    }
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_meshes_and_next_cycle_retries() {
    let provider = Arc::new(FlakyProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider.clone(), sink.clone()).unwrap();
    let level = &terrain.levels()[0];

    // Healthy first cycle in the tile's north-west region.
    terrain.update(DVec2::new(10.0, 10.0)).await;
    assert_eq!(sink.rebuilt().len(), 4);

    // The service goes down; the observer crosses into the south-east
    // region, forcing a rebuild of a mostly new ring.
    provider.failing.store(true, Ordering::SeqCst);
    terrain.update(DVec2::new(250.0, 250.0)).await;

    // Only tile (0, 0) is cache-served and recommits; the three failed
    // tiles commit nothing and every slot keeps a mesh.
    let records = sink.rebuilt();
    assert_eq!(records.len(), 5);
    assert_eq!((records[4].nx, records[4].nz), (0, 0));
    assert!(records[4].replaced_previous);
    for slot in level.tiles() {
        assert!(slot.lock().unwrap().mesh.is_some());
    }

    // Service recovers; moving back rebuilds the original (cached) ring.
    provider.failing.store(false, Ordering::SeqCst);
    terrain.update(DVec2::new(10.0, 10.0)).await;
    assert_eq!(sink.rebuilt().len(), 9);

    // Crossing south-east again refetches the tiles that failed earlier.
    terrain.update(DVec2::new(250.0, 250.0)).await;
    let records = sink.rebuilt();
    assert_eq!(records.len(), 13);
    assert_eq!(
        ring_set(&records[9..], 0),
        HashSet::from([(-1, -1), (0, -1), (-1, 0), (0, 0)])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_boundary_tiles_conform_to_parent_after_update_resolves() {
    // Zoom 9 rasters decode to floor(9*256*0.04) = 92, zoom 10 to 102.
    let config = TerrainConfig {
        min_zoom: 9,
        max_zoom: 10,
        ..single_level_config()
    };
    let terrain = Terrain::new(
        config,
        Arc::new(ZoomTintProvider),
        Arc::new(RecordingSink::default()),
    )
    .unwrap();

    terrain.update(DVec2::new(10.0, 10.0)).await;
    // No detached stitch may rewrite a conformed vertex after the tick.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let finest = &terrain.levels()[1];
    let mut edge_tiles = 0;
    for slot in finest.tiles() {
        let tile = slot.lock().unwrap();
        let Some(side) = tile.clip_side.filter(|s| s.is_edge()) else {
            continue;
        };
        edge_tiles += 1;
        let mesh = tile.mesh.as_ref().expect("edge tiles are committed");
        let n = mesh.side();
        for i in 0..n {
            let (row, col) = match side {
                ClipSide::Top => (0, i),
                ClipSide::Bottom => (n - 1, i),
                ClipSide::Left => (i, 0),
                ClipSide::Right => (i, n - 1),
                _ => unreachable!("edge sides only"),
            };
            assert_eq!(
                mesh.height_at(row, col),
                92.0,
                "outward edge must carry the parent's height"
            );
        }
        // Interior stays at the fine level's own height.
        assert_eq!(mesh.height_at(n / 2, n / 2), 102.0);
    }
    assert_eq!(edge_tiles, 2);
}

#[tokio::test]
async fn test_update_from_reads_the_observer_accessor() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink).unwrap();

    let observer = TestObserver {
        position: Mutex::new(DVec3::new(266.0, 5.0, 10.0)),
    };
    terrain.update_from(&observer).await;

    assert_eq!(terrain.levels()[0].tile_number(), (1, 0));
}

#[tokio::test]
async fn test_start_pins_observer_to_origin_and_lifts_to_surface() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink).unwrap();

    let observer = TestObserver {
        position: Mutex::new(DVec3::new(500.0, 3.0, -200.0)),
    };
    let probe: &GroundProbe = &|mesh: &TileMesh| Some(mesh.positions[0].y as f64 + 1.7);

    terrain.start(&observer, Some(probe)).await;

    let position = observer.position();
    assert_eq!(position.x, 0.0);
    assert_eq!(position.z, 0.0);
    // Flat surface at 10 plus the probe's eye clearance.
    assert_eq!(position.y, 11.7);
}

#[tokio::test]
async fn test_start_leaves_height_alone_when_probe_misses() {
    let provider = Arc::new(ConstProvider::new(raster(16, 0, 1, 0)));
    let sink = Arc::new(RecordingSink::default());
    let terrain = Terrain::new(single_level_config(), provider, sink).unwrap();

    let observer = TestObserver {
        position: Mutex::new(DVec3::new(500.0, 3.0, -200.0)),
    };
    let probe: &GroundProbe = &|_mesh: &TileMesh| None;

    terrain.start(&observer, Some(probe)).await;

    let position = observer.position();
    assert_eq!(position.x, 0.0);
    assert_eq!(position.z, 0.0);
    assert_eq!(position.y, 3.0);
}
