//! Mapbox terrain-RGB elevation provider.
//!
//! Fetches elevation rasters from Mapbox's `terrain-rgb` tileset. Each tile
//! is a 256×256 PNG whose pixels pack elevation into the RGB channels (see
//! [`crate::heightmap`] for the decoding rule).
//!
//! # URL pattern
//!
//! `https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.pngraw?access_token={token}`
//!
//! Requires a Mapbox access token. Tiles use standard XYZ Web Mercator
//! addressing: x grows east, y grows south.

use super::http::AsyncHttpClient;
use super::types::{HeightTileProvider, ProviderError};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Base URL for the terrain-RGB tileset.
const TERRAIN_RGB_BASE_URL: &str = "https://api.mapbox.com/v4/mapbox.terrain-rgb";

/// Minimum zoom with terrain-RGB coverage.
const MIN_ZOOM: u8 = 0;

/// Maximum zoom with terrain-RGB coverage.
const MAX_ZOOM: u8 = 15;

/// Mapbox terrain-RGB provider.
pub struct TerrainRgbProvider<C: AsyncHttpClient> {
    http_client: C,
    access_token: String,
}

impl<C: AsyncHttpClient> TerrainRgbProvider<C> {
    /// Creates a provider with the given access token.
    pub fn new(http_client: C, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
        }
    }

    fn build_url(&self, x: i32, z: i32, zoom: u8) -> String {
        format!(
            "{}/{}/{}/{}.pngraw?access_token={}",
            TERRAIN_RGB_BASE_URL, zoom, x, z, self.access_token
        )
    }
}

impl<C: AsyncHttpClient> HeightTileProvider for TerrainRgbProvider<C> {
    fn fetch(&self, x: i32, z: i32, zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        async move {
            if !self.supports_zoom(zoom) {
                return Err(ProviderError::UnsupportedZoom(zoom));
            }
            let url = self.build_url(x, z, zoom);
            self.http_client.get(&url).await
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "mapbox-terrain-rgb"
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}
