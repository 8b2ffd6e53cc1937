//! Streaming clipmap terrain for remote heightmap services.
//!
//! `terralayer` maintains a chain of concentric level-of-detail rings around
//! a moving observer. Each ring is a 2×2 grid of terrain tiles at one zoom of
//! a raster heightmap service; tile world size doubles per level away from
//! the finest ring, so nearby ground is sampled densely and distant ground
//! coarsely. As the observer moves, rings recenter by circular shifts,
//! rebuild their tiles asynchronously (stale rebuilds are cancelled by
//! generation tokens), and stitch seams so independently built neighbors
//! share exact edge geometry.
//!
//! The crate is renderer-agnostic: it produces [`geometry::TileMesh`] vertex
//! buffers and hands them to a [`scene::SceneSink`] owned by the embedder.
//!
//! # Layout
//!
//! - [`clipmap`] — the terrain root, level rings, tile lifecycle
//! - [`config`] — construction parameters and validation
//! - [`coord`] — geodetic ↔ planar Web Mercator conversion
//! - [`provider`] — remote heightmap tile fetching
//! - [`heightmap`] — raster decode and height extraction
//! - [`store`] — two-tier cache between providers and levels
//! - [`geometry`] — tile mesh construction and normals
//! - [`ring`] — corner/seam bookkeeping for the 2×2 rings
//! - [`seam`] — same-level and cross-level edge stitching
//! - [`scene`] — embedder-facing traits (scene sink, observer position)
//! - [`logging`] — optional ready-made `tracing` subscriber

pub mod clipmap;
pub mod config;
pub mod coord;
pub mod geometry;
pub mod heightmap;
pub mod logging;
pub mod provider;
pub mod ring;
pub mod scene;
pub mod seam;
pub mod store;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
