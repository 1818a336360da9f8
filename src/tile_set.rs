//! Construction of the fixed set of tiles that covers the terrain.
//!
//! The four innermost tiles have the smallest scale and surround the focal point.
//! Each following ring consists of twelve tiles with twice the scale of the previous ring and
//! completes the square built so far to one with twice the side length.
//!
//! ```text
//! +---+---+---+---+
//! | A | A | A | A |
//! +---+---+---+---+
//! | A |   |   | A |
//! +---+---+---+---+
//! | A |   |   | A |
//! +---+---+---+---+
//! | A | A | A | A |
//! +---+---+---+---+
//! ```
//!
//! Only outward facing edges of a ring border a larger neighbour, thus only those are morphed.

use crate::{
    config::TerrainConfig,
    error::TerrainResult,
    tile::{EdgeMask, Tile},
};
use bevy::prelude::*;

/// The four center tiles, as multiples of the base scale.
const CENTER: [IVec2; 4] = [
    IVec2::new(-1, -1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(0, -1),
];

/// The twelve tiles of a ring, as multiples of the ring scale, with their outward edges.
const RING: [(IVec2, EdgeMask); 12] = [
    (
        IVec2::new(-2, -2),
        EdgeMask::BOTTOM.union(EdgeMask::LEFT),
    ),
    (IVec2::new(-2, -1), EdgeMask::LEFT),
    (IVec2::new(-2, 0), EdgeMask::LEFT),
    (IVec2::new(-2, 1), EdgeMask::TOP.union(EdgeMask::LEFT)),
    (IVec2::new(-1, -2), EdgeMask::BOTTOM),
    (IVec2::new(-1, 1), EdgeMask::TOP),
    (IVec2::new(0, -2), EdgeMask::BOTTOM),
    (IVec2::new(0, 1), EdgeMask::TOP),
    (
        IVec2::new(1, -2),
        EdgeMask::BOTTOM.union(EdgeMask::RIGHT),
    ),
    (IVec2::new(1, -1), EdgeMask::RIGHT),
    (IVec2::new(1, 0), EdgeMask::RIGHT),
    (IVec2::new(1, 1), EdgeMask::TOP.union(EdgeMask::RIGHT)),
];

/// Builds the tiles of a terrain from its construction parameters.
pub struct TileSetBuilder {
    world_width: f32,
    base_scale: f32,
    resolution: u32,
}

impl TileSetBuilder {
    pub fn new(config: &TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;

        Ok(Self {
            world_width: config.world_width,
            base_scale: config.base_scale(),
            resolution: config.resolution,
        })
    }

    /// The scales of all rings, from the innermost outwards.
    ///
    /// The outermost ring has a scale of a quarter of the world width,
    /// so that the finished square has a side length of exactly the world width.
    pub fn ring_scales(&self) -> impl Iterator<Item = f32> {
        let world_width = self.world_width;

        std::iter::successors(Some(self.base_scale), |scale| Some(scale * 2.0))
            .take_while(move |&scale| scale < world_width / 2.0)
    }

    pub fn build(&self) -> Vec<Tile> {
        let center = CENTER
            .iter()
            .map(|&position| self.tile(position, self.base_scale, EdgeMask::NONE));

        let rings = self.ring_scales().flat_map(|scale| {
            RING.iter()
                .map(move |&(position, edge_mask)| self.tile(position, scale, edge_mask))
        });

        center.chain(rings).collect()
    }

    fn tile(&self, position: IVec2, scale: f32, edge_mask: EdgeMask) -> Tile {
        Tile::new(position.as_vec2() * scale, scale, edge_mask, self.resolution)
    }
}
