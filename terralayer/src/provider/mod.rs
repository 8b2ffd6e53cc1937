//! Remote heightmap tile providers.
//!
//! A [`HeightTileProvider`] turns a tile coordinate and zoom level into raw
//! raster bytes. The production implementation is [`TerrainRgbProvider`] over
//! a [`ReqwestClient`]; tests inject canned rasters through the same traits.

mod http;
mod terrain_rgb;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient};
pub use terrain_rgb::TerrainRgbProvider;
pub use types::{HeightTileProvider, ProviderError};
