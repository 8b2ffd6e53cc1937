//! Cache keys, statistics and errors for the height store.

use crate::heightmap::HeightmapError;
use crate::provider::ProviderError;
use thiserror::Error;

/// Key for the resolution-independent image tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ImageKey {
    pub x: i32,
    pub z: i32,
    pub zoom: u8,
}

/// Key for the resolution-specific sample tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleKey {
    /// Tile x index.
    pub x: i32,
    /// Tile z index.
    pub z: i32,
    /// Zoom level.
    pub zoom: u8,
    /// Samples per side of the resampled array.
    pub size: u32,
}

/// Hit and fetch counters for the two cache tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    /// Sample-tier hits (no decode, no fetch).
    pub sample_hits: u64,
    /// Image-tier hits (decode only, no fetch).
    pub image_hits: u64,
    /// Raster fetches that went to the provider.
    pub fetches: u64,
}

/// Errors surfaced by [`super::HeightStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote fetch failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The fetched raster could not be decoded.
    #[error(transparent)]
    Heightmap(#[from] HeightmapError),
}
