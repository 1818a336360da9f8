//! CPU reference of the elevation lookup performed in the shading stage of every tile.
//!
//! The elevation is a fractal sum of several octaves of the [`HeightField`], sampled at
//! increasing frequencies with decreasing amplitudes, raised to a power above one so that the
//! terrain gets sharper, rockier peaks.

use crate::{height_field::HeightField, tile::Tile};
use bevy::prelude::*;

/// The ground distance covered by the height field at the lowest octave.
pub const FEATURE_SIZE: f32 = 1024.0;
/// Pairs of amplitude and frequency.
pub const OCTAVES: [(f32, f32); 3] = [(1024.0, 1.0), (64.0, 16.0), (4.0, 256.0)];
pub const ROCKY_EXPONENT: f32 = 1.5;
pub const HEIGHT_DIVISOR: f32 = 20.0;

#[derive(Clone, Copy)]
pub struct ElevationSampler<'a> {
    field: &'a HeightField,
}

impl<'a> ElevationSampler<'a> {
    pub fn new(field: &'a HeightField) -> Self {
        Self { field }
    }

    /// The largest elevation any point of the terrain can reach.
    pub fn max_elevation() -> f32 {
        let amplitude: f32 = OCTAVES.iter().map(|&(amplitude, _)| amplitude).sum();
        shape(amplitude)
    }

    /// The mip level matching a vertex spacing of `grid_step` for an octave.
    fn lod(&self, frequency: f32, grid_step: f32) -> f32 {
        let texels_per_unit = self.field.size() as f32 * frequency / FEATURE_SIZE;
        (grid_step * texels_per_unit).max(1.0).log2()
    }

    /// The elevation at a position on the ground plane, sampled for a vertex spacing of `grid_step`.
    /// A `grid_step` of zero samples the full resolution data.
    pub fn elevation(&self, position: Vec2, grid_step: f32) -> f32 {
        let st = position / FEATURE_SIZE;

        let height = OCTAVES
            .iter()
            .map(|&(amplitude, frequency)| {
                let lod = self.lod(frequency, grid_step);
                amplitude * self.field.sample_lod(frequency * st, lod)
            })
            .sum();

        shape(height)
    }

    /// The displaced world space position of a tile vertex, as computed in the vertex stage.
    ///
    /// `p` is the local unit quad coordinate of the vertex.
    pub fn tile_vertex(&self, tile: &Tile, p: Vec2, global_offset: Vec2) -> Vec3 {
        let position = tile.vertex_position(p, global_offset);
        let height = self.elevation(position, tile.sample_step(p));

        Vec3::new(position.x, height, position.y)
    }

    /// The surface normal in world space, where the ground plane spans the x and z axes.
    pub fn normal(&self, position: Vec2, grid_step: f32) -> Vec3 {
        let delta = grid_step.max(1.0);

        let dx = self.elevation(position + Vec2::X * delta, grid_step)
            - self.elevation(position - Vec2::X * delta, grid_step);
        let dz = self.elevation(position + Vec2::Y * delta, grid_step)
            - self.elevation(position - Vec2::Y * delta, grid_step);

        let tangent_x = Vec3::new(2.0 * delta, dx, 0.0);
        let tangent_z = Vec3::new(0.0, dz, 2.0 * delta);

        tangent_z.cross(tangent_x).normalize()
    }
}

#[inline]
fn shape(height: f32) -> f32 {
    height.powf(ROCKY_EXPONENT) / HEIGHT_DIVISOR
}
