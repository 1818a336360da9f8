//! The elevation source shared by every tile of a terrain.
//!
//! A [`HeightField`] is a square grid of scalars in `[0,1]` with a side length that is a power
//! of two. It is immutable after creation and keeps a full mip chain (down to `1x1`), so that
//! far-away tiles can sample a filtered average instead of aliasing noise.
//! Coordinates outside of `[0,1)` are mirrored, which matches the sampler used on the GPU.

use crate::{
    config::HeightFieldSource,
    error::{TerrainError, TerrainResult},
};
use bevy::{
    image::{ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor},
    prelude::*,
    render::{
        render_asset::RenderAssetUsages,
        render_resource::{Extent3d, TextureDimension, TextureFormat},
    },
};
use image::DynamicImage;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct HeightField {
    /// Level zero holds the full resolution data, each following level half the side length.
    mips: Vec<Array2<f32>>,
}

impl HeightField {
    /// Creates a height field from row-major data (`[[y, x]]`), values are clamped to `[0,1]`.
    pub fn from_array(mut data: Array2<f32>) -> TerrainResult<Self> {
        let (height, width) = data.dim();

        if width != height {
            return Err(TerrainError::NonSquareHeightField {
                width: width as u32,
                height: height as u32,
            });
        }
        if !width.is_power_of_two() {
            return Err(TerrainError::InvalidHeightFieldSize(width as u32));
        }

        data.mapv_inplace(|value| value.clamp(0.0, 1.0));

        let mut mips = vec![data];

        while let Some(parent) = mips.last().filter(|level| level.nrows() > 1) {
            let child = downsample(parent);
            mips.push(child);
        }

        Ok(Self { mips })
    }

    /// Fills a height field with independent uniform random samples, quantized to eight bits.
    pub fn random(size: u32, rng: &mut impl Rng) -> TerrainResult<Self> {
        if !size.is_power_of_two() {
            return Err(TerrainError::InvalidHeightFieldSize(size));
        }

        let data = Array2::from_shape_simple_fn((size as usize, size as usize), || {
            rng.random::<u8>() as f32 / 255.0
        });

        Self::from_array(data)
    }

    pub fn from_image(image: &DynamicImage) -> TerrainResult<Self> {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();

        if width != height {
            return Err(TerrainError::NonSquareHeightField { width, height });
        }

        let data = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            luma.get_pixel(x as u32, y as u32).0[0] as f32 / 255.0
        });

        Self::from_array(data)
    }

    pub fn load_image<P: AsRef<Path>>(path: P) -> TerrainResult<Self> {
        let image = image::open(path)?;
        Self::from_image(&image)
    }

    pub fn from_source(source: &HeightFieldSource) -> TerrainResult<Self> {
        match source {
            HeightFieldSource::Random { size, seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_os_rng(),
                };
                Self::random(*size, &mut rng)
            }
            HeightFieldSource::Image { path } => Self::load_image(path),
        }
    }

    /// The side length of the full resolution level.
    #[inline]
    pub fn size(&self) -> u32 {
        self.mips[0].nrows() as u32
    }

    #[inline]
    pub fn mip_level_count(&self) -> u32 {
        self.mips.len() as u32
    }

    pub fn level(&self, lod: u32) -> &Array2<f32> {
        &self.mips[(lod as usize).min(self.mips.len() - 1)]
    }

    /// Reads a single texel of a mip level, mirroring indices outside of the grid.
    pub fn texel(&self, lod: u32, x: i64, y: i64) -> f32 {
        let level = self.level(lod);
        let size = level.nrows() as i64;

        level[[mirror(y, size), mirror(x, size)]]
    }

    /// Bilinearly filtered sample of the full resolution level.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> f32 {
        self.sample_level(uv, 0)
    }

    /// Trilinearly filtered sample, `lod` is clamped to the available mip chain.
    pub fn sample_lod(&self, uv: Vec2, lod: f32) -> f32 {
        let max_lod = (self.mip_level_count() - 1) as f32;
        let lod = if lod.is_nan() { 0.0 } else { lod.clamp(0.0, max_lod) };

        let lower = lod.floor();
        let blend = lod - lower;

        let a = self.sample_level(uv, lower as u32);

        if blend == 0.0 {
            a
        } else {
            let b = self.sample_level(uv, lower as u32 + 1);
            a + (b - a) * blend
        }
    }

    fn sample_level(&self, uv: Vec2, lod: u32) -> f32 {
        let size = self.level(lod).nrows() as f64;

        // texel centers lie at half integer coordinates
        let x = wrap_mirror_period(uv.x as f64 * size - 0.5, size);
        let y = wrap_mirror_period(uv.y as f64 * size - 0.5, size);
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = ((x - x0) as f32, (y - y0) as f32);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(self.texel(lod, x0, y0), self.texel(lod, x0 + 1, y0), fx);
        let bottom = lerp(
            self.texel(lod, x0, y0 + 1),
            self.texel(lod, x0 + 1, y0 + 1),
            fx,
        );

        lerp(top, bottom, fy).clamp(0.0, 1.0)
    }

    /// Converts the height field into a single channel GPU texture containing the full mip chain,
    /// sampled with mirrored repeat and trilinear filtering.
    pub fn to_image(&self) -> Image {
        let data = self
            .mips
            .iter()
            .flat_map(|level| level.iter())
            .map(|&value| (value * 255.0).round() as u8)
            .collect();

        let mut image = Image {
            data,
            asset_usage: RenderAssetUsages::RENDER_WORLD,
            ..default()
        };

        image.texture_descriptor.label = Some("height_field");
        image.texture_descriptor.size = Extent3d {
            width: self.size(),
            height: self.size(),
            depth_or_array_layers: 1,
        };
        image.texture_descriptor.dimension = TextureDimension::D2;
        image.texture_descriptor.format = TextureFormat::R8Unorm;
        image.texture_descriptor.mip_level_count = self.mip_level_count();

        image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
            label: Some("height_field_sampler".to_string()),
            address_mode_u: ImageAddressMode::MirrorRepeat,
            address_mode_v: ImageAddressMode::MirrorRepeat,
            mag_filter: ImageFilterMode::Linear,
            min_filter: ImageFilterMode::Linear,
            mipmap_filter: ImageFilterMode::Linear,
            ..default()
        });

        image
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Reduces a texel coordinate into one period of the mirrored repetition, `[0, 2 * size)`.
/// Non-finite coordinates map to the first texel.
#[inline]
fn wrap_mirror_period(coordinate: f64, size: f64) -> f64 {
    if coordinate.is_finite() {
        coordinate.rem_euclid(2.0 * size)
    } else {
        0.0
    }
}

/// Maps an arbitrary index into `[0, size)` with mirrored repetition.
#[inline]
fn mirror(index: i64, size: i64) -> usize {
    let index = index.rem_euclid(2 * size);

    if index < size {
        index as usize
    } else {
        (2 * size - 1 - index) as usize
    }
}

fn downsample(parent: &Array2<f32>) -> Array2<f32> {
    let size = parent.nrows() / 2;

    Array2::from_shape_fn((size, size), |(y, x)| {
        0.25 * (parent[[2 * y, 2 * x]]
            + parent[[2 * y, 2 * x + 1]]
            + parent[[2 * y + 1, 2 * x]]
            + parent[[2 * y + 1, 2 * x + 1]])
    })
}
