//! Coordinate conversion module.
//!
//! Converts between geodetic coordinates (latitude/longitude) and the planar
//! Web Mercator pixel space the clipmap operates in. The planar space is
//! addressed in heightmap-tile pixels at a fixed zoom level, so a tile of
//! `tile_px` pixels covers exactly `tile_px` planar units.

mod types;

pub use types::{CoordError, GeoCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

use glam::DVec2;
use std::f64::consts::PI;

/// Converts a geodetic coordinate to planar Web Mercator pixel coordinates.
///
/// The result is in pixels at the given zoom level, with `tile_px` pixels per
/// tile. The x axis grows east, the z axis grows south (screen convention used
/// by all raster tile services).
///
/// # Errors
///
/// Returns [`CoordError`] when the coordinate or zoom is out of range.
pub fn geo_to_planar(coord: GeoCoord, zoom: u8, tile_px: u32) -> Result<DVec2, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&coord.lat) {
        return Err(CoordError::InvalidLatitude(coord.lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&coord.lon) {
        return Err(CoordError::InvalidLongitude(coord.lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let world = tile_px as f64 * 2.0_f64.powi(zoom as i32);
    let x = (coord.lon + 180.0) / 360.0 * world;
    let lat_rad = coord.lat * PI / 180.0;
    let z = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world;

    Ok(DVec2::new(x, z))
}

/// Converts planar Web Mercator pixel coordinates back to a geodetic
/// coordinate.
pub fn planar_to_geo(planar: DVec2, zoom: u8, tile_px: u32) -> Result<GeoCoord, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let world = tile_px as f64 * 2.0_f64.powi(zoom as i32);
    let lon = planar.x / world * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * planar.y / world)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    Ok(GeoCoord::new(lat, lon))
}

/// Returns the logical tile index containing a planar position, for a level
/// whose tiles are `tile_world_size` planar units on a side.
#[inline]
pub fn tile_index(planar: DVec2, tile_world_size: f64) -> (i32, i32) {
    (
        (planar.x / tile_world_size).floor() as i32,
        (planar.y / tile_world_size).floor() as i32,
    )
}
