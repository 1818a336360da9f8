//! This crate renders an endless height-field terrain with a fixed set of tiles.
//!
//! # Background
//! The ground plane around the view is covered by concentric rings of square tiles, whose size
//! doubles from ring to ring. All tiles share one mesh, the vertex stage scales and places
//! each of them and displaces its vertices by a fractal lookup into a single height field.
//! The edges where a ring meets its coarser neighbour are morphed onto the coarser grid, so
//! that no cracks appear between the levels of detail.
//!
//! The tile set never moves or changes.
//! Instead the terrain accumulates the travel of the [`TerrainView`](plugin::TerrainView)
//! into a global offset, which is wrapped and flipped by the
//! [`RecenteringController`](recenter::RecenteringController) to stay bounded, so that the
//! terrain appears infinite without ever losing float precision.

pub mod backend;
pub mod config;
pub mod debug;
pub mod elevation;
pub mod error;
pub mod flight;
pub mod height_field;
pub mod material;
pub mod mesh;
pub mod plugin;
pub mod recenter;
pub mod shaders;
pub mod terrain;
pub mod tile;
pub mod tile_set;

pub mod prelude {
    pub use crate::{
        backend::RenderBackendInfo,
        config::{HeightFieldSource, TerrainConfig},
        debug::{TerrainDebug, TerrainDebugPlugin},
        elevation::ElevationSampler,
        error::{TerrainError, TerrainResult},
        flight::CircularFlight,
        height_field::HeightField,
        material::TerrainMaterial,
        plugin::{TerrainLight, TerrainPlugin, TerrainTile, TerrainTiles, TerrainView},
        recenter::{Flip, RecenteringController},
        terrain::Terrain,
        tile::{EdgeMask, Tile, TileUniform},
        tile_set::TileSetBuilder,
    };
}
