//! Coordinate types and validation constants.

use thiserror::Error;

/// Maximum latitude representable in the Web Mercator projection.
pub const MAX_LAT: f64 = 85.051_128_78;
/// Minimum latitude representable in the Web Mercator projection.
pub const MIN_LAT: f64 = -85.051_128_78;
/// Minimum longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum longitude in degrees.
pub const MAX_LON: f64 = 180.0;
/// Maximum zoom level supported by the projection utilities.
pub const MAX_ZOOM: u8 = 22;

/// A geodetic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoord {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl GeoCoord {
    /// Create a new geodetic coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Errors produced by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("latitude {0} outside valid range ({MIN_LAT}..={MAX_LAT})")]
    InvalidLatitude(f64),

    /// Longitude outside the valid range.
    #[error("longitude {0} outside valid range ({MIN_LON}..={MAX_LON})")]
    InvalidLongitude(f64),

    /// Zoom level beyond what the projection supports.
    #[error("zoom level {0} exceeds maximum {MAX_ZOOM}")]
    InvalidZoom(u8),
}
