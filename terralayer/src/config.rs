//! Terrain configuration and validation.

use crate::coord::GeoCoord;
use crate::heightmap::{DEFAULT_AMPLITUDE, DEFAULT_OFFSET};
use glam::DVec2;
use thiserror::Error;

/// Where the terrain is anchored in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    /// A geodetic coordinate, projected to planar space at the finest zoom.
    Geodetic(GeoCoord),
    /// A planar Web Mercator pixel position at the finest zoom.
    Planar(DVec2),
}

/// Configuration for a terrain instance.
///
/// `min_zoom..=max_zoom` fixes the clipmap chain: one level per zoom,
/// coarsest first, each level's tile world size exactly half its parent's.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// World anchor. Required; construction fails without one.
    pub origin: Option<Origin>,
    /// Coarsest zoom level in the chain.
    pub min_zoom: u8,
    /// Finest zoom level in the chain.
    pub max_zoom: u8,
    /// Native raster resolution of a heightmap tile, in pixels per side.
    pub tile_resolution: u32,
    /// World-space size of a finest-level tile, in scene units.
    pub tile_size: f64,
    /// Fraction of the raster resolution sampled into each tile mesh
    /// (0 < scale ≤ 1). `tile_resolution * detail_scale` must be even so
    /// cross-level seams land on the parent's vertex grid.
    pub detail_scale: f64,
    /// Vertical decode amplitude (see [`crate::heightmap`]).
    pub amplitude: f64,
    /// Vertical decode offset.
    pub height_offset: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            origin: None,
            min_zoom: 10,
            max_zoom: 13,
            tile_resolution: 256,
            tile_size: 256.0,
            detail_scale: 0.25,
            amplitude: DEFAULT_AMPLITUDE,
            height_offset: DEFAULT_OFFSET,
        }
    }
}

impl TerrainConfig {
    /// Number of clipmap levels the zoom range spans.
    pub fn level_count(&self) -> usize {
        (self.max_zoom - self.min_zoom) as usize + 1
    }

    /// Samples per tile-mesh side (`segments + 1`).
    pub fn sample_size(&self) -> u32 {
        (self.tile_resolution as f64 * self.detail_scale).round() as u32 + 1
    }

    /// Validates the configuration, returning the resolved origin.
    pub fn validate(&self) -> Result<Origin, ConfigError> {
        let origin = self.origin.ok_or(ConfigError::MissingOrigin)?;

        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if !(0.0..=1.0).contains(&self.detail_scale) || self.detail_scale == 0.0 {
            return Err(ConfigError::InvalidDetailScale(self.detail_scale));
        }

        let segments = self.sample_size() - 1;
        if segments < 2 || segments % 2 != 0 {
            return Err(ConfigError::OddSegmentCount(segments));
        }

        Ok(origin)
    }
}

/// Fatal configuration errors, surfaced at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Neither a geodetic coordinate nor a planar position was supplied.
    #[error("terrain requires an origin: either a geodetic coordinate or a planar position")]
    MissingOrigin,

    /// `min_zoom` exceeds `max_zoom`.
    #[error("invalid zoom range: min {min} > max {max}")]
    InvalidZoomRange { min: u8, max: u8 },

    /// Detail scale outside (0, 1].
    #[error("detail scale {0} outside (0, 1]")]
    InvalidDetailScale(f64),

    /// The sampled segment count per tile must be even (and at least 2) for
    /// cross-level stitching to align.
    #[error("tile segment count {0} must be even and >= 2")]
    OddSegmentCount(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TerrainConfig {
        TerrainConfig {
            origin: Some(Origin::Geodetic(GeoCoord::new(46.2, 7.5))),
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_missing_origin_is_fatal() {
        let config = TerrainConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::MissingOrigin));
    }

    #[test]
    fn test_default_with_origin_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        let config = TerrainConfig {
            min_zoom: 14,
            max_zoom: 10,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidZoomRange { min: 14, max: 10 })
        ));
    }

    #[test]
    fn test_odd_segment_count_rejected() {
        let config = TerrainConfig {
            tile_resolution: 20,
            detail_scale: 0.35, // 7 segments
            ..valid()
        };
        assert_eq!(config.validate(), Err(ConfigError::OddSegmentCount(7)));
    }

    #[test]
    fn test_sample_size_default() {
        // 256 * 0.25 = 64 segments, 65 samples per side.
        assert_eq!(valid().sample_size(), 65);
    }
}
