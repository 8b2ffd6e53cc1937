//! Height sample store.
//!
//! [`HeightStore`] is the fetch façade between the clipmap and the remote
//! elevation service. It memoizes work in two tiers:
//!
//! - **image tier** — the decoded native raster, keyed `(x, z, zoom)`.
//!   Resolution independent and shared by every resample request for that
//!   tile.
//! - **sample tier** — the resampled, decoded height array, keyed
//!   `(x, z, zoom, size)`.
//!
//! A sample-tier hit returns without touching the image tier; an image-tier
//! hit avoids the network entirely. Locks are only held around map access,
//! never across the fetch await, so concurrent requests for the same
//! unresolved key may each fetch once (accepted duplication; the later result
//! simply overwrites the identical earlier one).
//!
//! The store is an explicit instance owned by the terrain root and handed to
//! levels by `Arc`, never ambient global state.

mod types;

pub use types::{SampleKey, StoreError, StoreStats};

use crate::heightmap;
use crate::provider::HeightTileProvider;
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

use types::ImageKey;

/// Two-tier cache plus fetch façade for height samples.
pub struct HeightStore {
    provider: Arc<dyn HeightTileProvider>,
    amplitude: f64,
    offset: f64,
    images: Mutex<HashMap<ImageKey, Arc<RgbaImage>>>,
    samples: Mutex<HashMap<SampleKey, Arc<Vec<f32>>>>,
    stats: Mutex<StoreStats>,
}

impl HeightStore {
    /// Creates a store over the given provider with the given vertical
    /// decode parameters.
    pub fn new(provider: Arc<dyn HeightTileProvider>, amplitude: f64, offset: f64) -> Self {
        Self {
            provider,
            amplitude,
            offset,
            images: Mutex::new(HashMap::new()),
            samples: Mutex::new(HashMap::new()),
            stats: Mutex::new(StoreStats::default()),
        }
    }

    /// Returns the height-sample array for a tile at the requested
    /// resolution, fetching and decoding on cache miss.
    ///
    /// `size` is the samples-per-side of the result (`segments + 1`); the
    /// returned array has `size * size` entries in row-major order, rows
    /// north to south.
    pub async fn get_tile(
        &self,
        x: i32,
        z: i32,
        zoom: u8,
        size: u32,
    ) -> Result<Arc<Vec<f32>>, StoreError> {
        let key = SampleKey { x, z, zoom, size };

        if let Some(samples) = self.samples.lock().unwrap().get(&key) {
            self.stats.lock().unwrap().sample_hits += 1;
            trace!(?key, "sample tier hit");
            return Ok(Arc::clone(samples));
        }

        let image = self.get_image(x, z, zoom).await?;
        let resampled = heightmap::resample(&image, size);
        let samples = Arc::new(heightmap::decode_heights(
            &resampled,
            self.amplitude,
            self.offset,
        ));

        self.samples
            .lock()
            .unwrap()
            .insert(key, Arc::clone(&samples));

        Ok(samples)
    }

    /// Returns the decoded native raster for a tile, fetching on miss.
    async fn get_image(&self, x: i32, z: i32, zoom: u8) -> Result<Arc<RgbaImage>, StoreError> {
        let key = ImageKey { x, z, zoom };

        if let Some(image) = self.images.lock().unwrap().get(&key) {
            self.stats.lock().unwrap().image_hits += 1;
            trace!(?key, "image tier hit");
            return Ok(Arc::clone(image));
        }

        debug!(x, z, zoom, provider = self.provider.name(), "fetching tile");
        let bytes = self.provider.fetch(x, z, zoom).await?;
        self.stats.lock().unwrap().fetches += 1;

        let image = Arc::new(heightmap::decode_raster(&bytes)?);
        self.images.lock().unwrap().insert(key, Arc::clone(&image));

        Ok(image)
    }

    /// Snapshot of hit/fetch counters.
    pub fn stats(&self) -> StoreStats {
        self.stats.lock().unwrap().clone()
    }
}
