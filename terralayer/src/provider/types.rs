//! Provider trait and error types.

use futures::future::BoxFuture;
use thiserror::Error;

/// Errors that can occur while fetching a heightmap raster.
///
/// Carries owned strings rather than source errors so it stays `Clone`:
/// rebuild results flow through shared futures that every seam task can
/// re-await.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote service answered with a non-success status.
    #[error("tile service returned status {0}")]
    Status(u16),

    /// Zoom level not supported by this provider.
    #[error("zoom level {0} not supported by provider")]
    UnsupportedZoom(u8),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Source of raw heightmap raster tiles.
///
/// Implementors fetch the undecoded raster bytes for a tile coordinate at a
/// zoom level. The fetch boundary is the system's only suspension point on
/// network I/O; everything downstream of it is generation-checked.
pub trait HeightTileProvider: Send + Sync {
    /// Fetches the raster bytes for tile `(x, z)` at `zoom`.
    fn fetch(&self, x: i32, z: i32, zoom: u8) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>>;

    /// Provider name for logging and cache attribution.
    fn name(&self) -> &str;

    /// Minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Whether `zoom` falls inside the provider's supported range.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}
