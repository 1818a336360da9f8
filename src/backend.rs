use crate::{
    config::HeightFieldSource,
    error::{TerrainError, TerrainResult},
};
use bevy::{
    prelude::*,
    render::renderer::{RenderAdapterInfo, RenderDevice},
};

/// The capabilities of the render backend the terrain was checked against.
///
/// Terrain startup and all per-frame terrain systems only run while this resource exists.
#[derive(Resource, Clone, Debug)]
pub struct RenderBackendInfo {
    pub adapter_name: String,
    pub backend: String,
    pub max_texture_dimension_2d: u32,
}

impl RenderBackendInfo {
    /// Fails if a height field of the given side length can not be uploaded as a texture.
    pub fn supports_height_field(&self, size: u32) -> TerrainResult<()> {
        validate_texture_limit(self.max_texture_dimension_2d, size)
    }
}

pub fn validate_texture_limit(max_texture_dimension_2d: u32, size: u32) -> TerrainResult<()> {
    if size > max_texture_dimension_2d {
        return Err(TerrainError::UnsupportedBackend(format!(
            "height field of size {size} exceeds the maximum texture dimension of {max_texture_dimension_2d}"
        )));
    }

    Ok(())
}

/// Checks that a render device exists and can hold the configured height field.
///
/// Image height fields are only checked once they are decoded.
pub fn check_render_backend(
    world: &World,
    height_field: &HeightFieldSource,
) -> TerrainResult<RenderBackendInfo> {
    let device = world.get_resource::<RenderDevice>().ok_or_else(|| {
        TerrainError::UnsupportedBackend("no render device is available".to_string())
    })?;

    let (adapter_name, backend) = world
        .get_resource::<RenderAdapterInfo>()
        .map(|info| (info.name.clone(), format!("{:?}", info.backend)))
        .unwrap_or_default();

    let info = RenderBackendInfo {
        adapter_name,
        backend,
        max_texture_dimension_2d: device.limits().max_texture_dimension_2d,
    };

    if let HeightFieldSource::Random { size, .. } = height_field {
        info.supports_height_field(*size)?;
    }

    Ok(info)
}
