use crate::{shaders::TERRAIN_SHADER, tile::TileUniform};
use bevy::{
    prelude::*,
    render::render_resource::{AsBindGroup, ShaderRef},
};

/// The material of a single tile.
///
/// Each tile owns its material, so that writing the parameters of one tile never aliases
/// another. All materials of a terrain share the same height field image.
#[derive(Asset, AsBindGroup, TypePath, Clone, Debug)]
pub struct TerrainMaterial {
    #[uniform(0)]
    pub tile: TileUniform,
    #[texture(1)]
    #[sampler(2)]
    pub height_field: Handle<Image>,
}

impl TerrainMaterial {
    pub fn new(tile: TileUniform, height_field: Handle<Image>) -> Self {
        Self { tile, height_field }
    }
}

impl Material for TerrainMaterial {
    fn vertex_shader() -> ShaderRef {
        TERRAIN_SHADER.into()
    }

    fn fragment_shader() -> ShaderRef {
        TERRAIN_SHADER.into()
    }
}
