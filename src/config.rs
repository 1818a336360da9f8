use crate::error::{TerrainError, TerrainResult};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Where the elevation data of the terrain comes from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum HeightFieldSource {
    /// Independent uniform random samples per cell.
    /// Without a seed the generator is seeded from the operating system.
    Random { size: u32, seed: Option<u64> },
    /// A square, power-of-two grayscale image.
    Image { path: PathBuf },
}

impl Default for HeightFieldSource {
    fn default() -> Self {
        Self::Random {
            size: 2048,
            seed: None,
        }
    }
}

/// The construction parameters of a terrain.
///
/// `world_width`, `levels` and `resolution` jointly determine the tile count and
/// the memory footprint of the terrain.
/// They must satisfy `world_width = base_scale * 2^levels` for a power-of-two `base_scale`.
#[derive(Serialize, Deserialize, Resource, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// The logical extent approximated by the tile set.
    pub world_width: f32,
    /// The count of octaves.
    pub levels: u32,
    /// The vertex grid subdivisions of each tile.
    pub resolution: u32,
    pub height_field: HeightFieldSource,
    /// Initial light position in world space, used until a `TerrainLight` is present.
    pub light_position: Vec3,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            world_width: 65536.0,
            levels: 3,
            resolution: 256,
            height_field: default(),
            light_position: Vec3::new(-400.0, 3000.0, -400.0),
        }
    }
}

impl TerrainConfig {
    pub fn new(world_width: f32, levels: u32, resolution: u32) -> Self {
        Self {
            world_width,
            levels,
            resolution,
            ..default()
        }
    }

    pub fn with_height_field(mut self, height_field: HeightFieldSource) -> Self {
        self.height_field = height_field;
        self
    }

    pub fn from_ron(source: &str) -> TerrainResult<Self> {
        Ok(ron::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> TerrainResult<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_ron(&source)
    }

    /// The scale of the four innermost tiles.
    #[inline]
    pub fn base_scale(&self) -> f32 {
        self.world_width / 2.0_f32.powi(self.levels as i32)
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        4 + 12 * self.levels.saturating_sub(1) as usize
    }

    /// Distance of the accumulated offset at which the recentering flips it.
    #[inline]
    pub fn flip_distance(&self) -> f32 {
        self.world_width / 16.0
    }

    pub fn validate(&self) -> TerrainResult<()> {
        if !self.world_width.is_finite() || self.world_width <= 0.0 {
            return Err(TerrainError::InvalidWorldWidth(self.world_width));
        }

        if !is_power_of_two(self.base_scale()) {
            return Err(TerrainError::NonPowerOfTwoBaseScale {
                world_width: self.world_width,
                levels: self.levels,
            });
        }

        if self.resolution == 0 {
            return Err(TerrainError::ZeroResolution);
        }

        if (self.resolution as u64 + 1).pow(2) > u32::MAX as u64 {
            return Err(TerrainError::ResolutionTooLarge(self.resolution));
        }

        Ok(())
    }
}

/// Whether the value is exactly a (possibly fractional) power of two.
pub(crate) fn is_power_of_two(value: f32) -> bool {
    const MANTISSA_MASK: u32 = 0x007F_FFFF;

    value.is_normal() && value > 0.0 && value.to_bits() & MANTISSA_MASK == 0
}
