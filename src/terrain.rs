use crate::{
    config::TerrainConfig,
    elevation::ElevationSampler,
    error::TerrainResult,
    height_field::HeightField,
    recenter::{Flip, RecenteringController},
    tile::{Tile, TileUniform},
    tile_set::TileSetBuilder,
};
use bevy::prelude::*;
use std::sync::Arc;

/// The terrain aggregate: its configuration, the shared height field, the static set of tiles
/// and the per-frame recentering state.
///
/// The tile set is fixed in count and topology for the lifetime of the terrain,
/// only the global offset changes from frame to frame.
#[derive(Component, Clone)]
pub struct Terrain {
    config: TerrainConfig,
    height_field: Arc<HeightField>,
    tiles: Vec<Tile>,
    recentering: RecenteringController,
}

impl Terrain {
    pub fn new(config: TerrainConfig, height_field: HeightField) -> TerrainResult<Self> {
        let tiles = TileSetBuilder::new(&config)?.build();
        let recentering = RecenteringController::new(config.world_width);

        info!(
            "Built terrain with {} tiles, base scale {} and a height field of size {}.",
            tiles.len(),
            config.base_scale(),
            height_field.size()
        );

        Ok(Self {
            config,
            height_field: Arc::new(height_field),
            tiles,
            recentering,
        })
    }

    /// Creates the terrain together with the height field described by its config.
    pub fn from_config(config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        let height_field = HeightField::from_source(&config.height_field)?;
        Self::new(config, height_field)
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    #[inline]
    pub fn height_field(&self) -> &HeightField {
        &self.height_field
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn global_offset(&self) -> Vec2 {
        self.recentering.global_offset()
    }

    #[inline]
    pub fn recentering(&self) -> &RecenteringController {
        &self.recentering
    }

    pub fn follow(&mut self, view_position: Vec3) {
        self.recentering.follow(view_position);
    }

    pub fn update_uniforms(&mut self) -> Option<Flip> {
        let flip = self.recentering.update_uniforms();

        if let Some(flip) = flip {
            debug!(
                "Flipped the terrain offset from {} to {} (flip #{}).",
                flip.previous,
                flip.offset,
                self.recentering.flip_count()
            );
        }

        flip
    }

    /// The parameter block of each tile, in tile order.
    pub fn tile_uniforms(&self, light_position: Vec3) -> impl Iterator<Item = TileUniform> + '_ {
        let global_offset = self.global_offset();

        self.tiles
            .iter()
            .map(move |tile| tile.uniform(global_offset, light_position))
    }

    pub fn elevation_sampler(&self) -> ElevationSampler<'_> {
        ElevationSampler::new(&self.height_field)
    }

    /// The elevation at a world position, sampled at full resolution.
    pub fn elevation_at(&self, world_position: Vec3) -> f32 {
        self.elevation_sampler()
            .elevation(world_position.xz(), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HeightFieldSource, error::TerrainError, tile::EdgeMask};

    fn config() -> TerrainConfig {
        TerrainConfig::new(65536.0, 3, 256).with_height_field(HeightFieldSource::Random {
            size: 64,
            seed: Some(11),
        })
    }

    #[test]
    fn from_config() {
        let terrain = Terrain::from_config(config()).unwrap();

        assert_eq!(terrain.tiles().len(), 28);
        assert_eq!(terrain.height_field().size(), 64);
        assert_eq!(terrain.global_offset(), Vec2::ZERO);
    }

    #[test]
    fn invalid_config_fails_before_height_field() {
        let config = TerrainConfig::new(65536.0, 3, 0).with_height_field(
            HeightFieldSource::Image {
                path: "does/not/exist.png".into(),
            },
        );

        assert!(matches!(
            Terrain::from_config(config),
            Err(TerrainError::ZeroResolution)
        ));
    }

    #[test]
    fn missing_height_field_image() {
        let config = TerrainConfig::default().with_height_field(HeightFieldSource::Image {
            path: "does/not/exist.png".into(),
        });

        assert!(matches!(
            Terrain::from_config(config),
            Err(TerrainError::Image(_))
        ));
    }

    #[test]
    fn uniforms_follow_flips() {
        let mut terrain = Terrain::from_config(config()).unwrap();

        terrain.follow(Vec3::new(0.0, 800.0, 0.0));
        terrain.follow(Vec3::new(5000.0, 800.0, 0.0));
        let flip = terrain.update_uniforms().unwrap();

        assert_eq!(flip.offset, Vec2::new(-5000.0, 0.0));

        let uniforms = terrain.tile_uniforms(Vec3::Z).collect::<Vec<_>>();
        assert_eq!(uniforms.len(), terrain.tiles().len());

        for (uniform, tile) in uniforms.iter().zip(terrain.tiles()) {
            assert_eq!(uniform.global_offset, flip.offset);
            assert_eq!(uniform.tile_offset, tile.origin);
            assert_eq!(uniform.edge_morph, tile.edge_mask.bits());
        }

        assert_eq!(uniforms[0].edge_morph, EdgeMask::NONE.bits());
    }

    #[test]
    fn elevation_uses_ground_plane() {
        let terrain = Terrain::from_config(config()).unwrap();
        let sampler = terrain.elevation_sampler();

        assert_eq!(
            terrain.elevation_at(Vec3::new(300.0, 9999.0, -700.0)),
            sampler.elevation(Vec2::new(300.0, -700.0), 0.0)
        );
    }
}
