use bevy::{prelude::*, render::render_resource::ShaderType};

/// Width of the band along a morphing edge, as a fraction of the tile size.
pub const MORPH_REGION: f32 = 0.1;

bitflags::bitflags! {
    /// The edges of a tile that border a lower resolution (larger scale) neighbour.
    ///
    /// Vertices close to these edges are morphed towards the coarser vertex grid of the neighbour,
    /// which avoids cracks between tiles of different scale.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct EdgeMask: u32 {
        const NONE   = 0;
        const TOP    = 1 << 0;
        const LEFT   = 1 << 1;
        const BOTTOM = 1 << 2;
        const RIGHT  = 1 << 3;
    }
}

impl EdgeMask {
    /// Whether the mask marks two adjacent edges, which is the case for the corner tiles of a ring.
    pub fn is_corner(self) -> bool {
        self.bits().count_ones() == 2
            && self != EdgeMask::TOP | EdgeMask::BOTTOM
            && self != EdgeMask::LEFT | EdgeMask::RIGHT
    }

    /// Distance of the local unit quad coordinate to each marked edge.
    fn edge_distances(self, p: Vec2) -> impl Iterator<Item = f32> {
        [
            (EdgeMask::TOP, 1.0 - p.y),
            (EdgeMask::LEFT, p.x),
            (EdgeMask::BOTTOM, p.y),
            (EdgeMask::RIGHT, 1.0 - p.x),
        ]
        .into_iter()
        .filter(move |&(edge, _)| self.contains(edge))
        .map(|(_, distance)| distance)
    }
}

/// Computes how far a vertex at the local unit quad coordinate `p` is morphed towards the
/// coarser grid of its neighbours.
///
/// The factor is one on a marked edge, zero at the inner boundary of the [`MORPH_REGION`] band
/// and rises smoothly and monotonically in between.
pub fn morph_factor(p: Vec2, edge_mask: EdgeMask) -> f32 {
    let ramp = edge_mask
        .edge_distances(p)
        .filter(|&distance| distance <= MORPH_REGION)
        .map(|distance| 1.0 - (distance / MORPH_REGION).clamp(0.0, 1.0))
        .fold(0.0, f32::max);

    smoothstep(ramp)
}

/// Snaps a plane position to the vertex grid of a tile and blends it by `morph` towards the grid
/// of a neighbour with twice the grid spacing.
pub fn morph_position(position: Vec2, scale: f32, resolution: u32, morph: f32) -> Vec2 {
    let grid = scale / resolution as f32;
    let fine = (position / grid).floor() * grid;

    if morph > 0.0 {
        let coarse_grid = 2.0 * grid;
        let coarse = (fine / coarse_grid).floor() * coarse_grid;
        fine.lerp(coarse, morph)
    } else {
        fine
    }
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// One square patch of the terrain.
///
/// All tiles share a single corner anchored unit quad, which is scaled by `scale` and
/// translated by `origin` in the shading stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    /// The corner with the smallest coordinates, relative to the focal point of the terrain.
    pub origin: Vec2,
    pub scale: f32,
    pub edge_mask: EdgeMask,
    /// The vertex grid subdivisions along each side.
    pub resolution: u32,
}

impl Tile {
    pub fn new(origin: Vec2, scale: f32, edge_mask: EdgeMask, resolution: u32) -> Self {
        Self {
            origin,
            scale,
            edge_mask,
            resolution,
        }
    }

    /// The area covered by the tile on the ground plane.
    pub fn footprint(&self) -> Rect {
        Rect::from_corners(self.origin, self.origin + Vec2::splat(self.scale))
    }

    /// The spacing between two neighbouring vertices.
    #[inline]
    pub fn grid_step(&self) -> f32 {
        self.scale / self.resolution as f32
    }

    /// The vertex spacing the elevation lookup filters for at a local unit quad coordinate.
    ///
    /// Morphed vertices blend towards the spacing of the coarser neighbour, so that both tiles
    /// read the same mip level along their shared edge.
    pub fn sample_step(&self, p: Vec2) -> f32 {
        self.grid_step() * (1.0 + morph_factor(p, self.edge_mask))
    }

    /// Maps a local unit quad coordinate to its morphed position on the ground plane.
    pub fn vertex_position(&self, p: Vec2, global_offset: Vec2) -> Vec2 {
        let position = self.scale * p + self.origin + global_offset;
        let morph = morph_factor(p, self.edge_mask);

        morph_position(position, self.scale, self.resolution, morph)
    }

    pub fn uniform(&self, global_offset: Vec2, light_position: Vec3) -> TileUniform {
        TileUniform {
            global_offset,
            tile_offset: self.origin,
            scale: self.scale,
            resolution: self.resolution as f32,
            edge_morph: self.edge_mask.bits(),
            debug_flags: 0,
            light_position,
        }
    }
}

/// The shading-stage parameter block of a single tile.
///
/// Every tile owns its own copy, only `global_offset`, `light_position` and `debug_flags`
/// change after construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, ShaderType)]
pub struct TileUniform {
    pub global_offset: Vec2,
    pub tile_offset: Vec2,
    pub scale: f32,
    pub resolution: f32,
    pub edge_morph: u32,
    pub debug_flags: u32,
    pub light_position: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_masks() {
        assert!((EdgeMask::BOTTOM | EdgeMask::LEFT).is_corner());
        assert!((EdgeMask::TOP | EdgeMask::RIGHT).is_corner());
        assert!(!(EdgeMask::TOP | EdgeMask::BOTTOM).is_corner());
        assert!(!(EdgeMask::LEFT | EdgeMask::RIGHT).is_corner());
        assert!(!EdgeMask::TOP.is_corner());
        assert!(!EdgeMask::NONE.is_corner());
    }

    #[test]
    fn bits_match_shader_constants() {
        assert_eq!(EdgeMask::TOP.bits(), 1);
        assert_eq!(EdgeMask::LEFT.bits(), 2);
        assert_eq!(EdgeMask::BOTTOM.bits(), 4);
        assert_eq!(EdgeMask::RIGHT.bits(), 8);
    }

    #[test]
    fn morph_is_one_on_the_edge() {
        assert_eq!(morph_factor(Vec2::new(0.5, 1.0), EdgeMask::TOP), 1.0);
        assert_eq!(morph_factor(Vec2::new(0.0, 0.5), EdgeMask::LEFT), 1.0);
        assert_eq!(morph_factor(Vec2::new(0.5, 0.0), EdgeMask::BOTTOM), 1.0);
        assert_eq!(morph_factor(Vec2::new(1.0, 0.5), EdgeMask::RIGHT), 1.0);
    }

    #[test]
    fn morph_is_zero_at_band_boundary() {
        assert_eq!(morph_factor(Vec2::new(0.5, 1.0 - MORPH_REGION), EdgeMask::TOP), 0.0);
        assert_eq!(morph_factor(Vec2::new(MORPH_REGION, 0.5), EdgeMask::LEFT), 0.0);
        assert_eq!(morph_factor(Vec2::new(0.5, 0.5), EdgeMask::all()), 0.0);
    }

    #[test]
    fn morph_ignores_unmarked_edges() {
        assert_eq!(morph_factor(Vec2::new(0.5, 1.0), EdgeMask::NONE), 0.0);
        assert_eq!(morph_factor(Vec2::new(0.5, 1.0), EdgeMask::BOTTOM), 0.0);
        assert_eq!(morph_factor(Vec2::new(1.0, 0.0), EdgeMask::LEFT), 0.0);
    }

    #[test]
    fn morph_is_monotonic() {
        let mut previous = 0.0;

        for i in 0..=100 {
            let x = MORPH_REGION * (1.0 - i as f32 / 100.0);
            let factor = morph_factor(Vec2::new(x, 0.5), EdgeMask::LEFT);

            assert!(factor >= previous, "{factor} < {previous} at x = {x}");
            previous = factor;
        }

        assert_eq!(previous, 1.0);
    }

    #[test]
    fn morph_takes_the_closest_marked_edge() {
        let mask = EdgeMask::BOTTOM | EdgeMask::LEFT;

        let corner = morph_factor(Vec2::new(0.0, 0.05), mask);
        let bottom_only = morph_factor(Vec2::new(0.5, 0.05), mask);

        assert_eq!(corner, 1.0);
        assert!(bottom_only > 0.0 && bottom_only < 1.0);
    }

    #[test]
    fn morphed_positions_snap_to_coarse_grid() {
        // grid step of 4, coarse grid step of 8
        let position = Vec2::new(13.0, 21.0);

        assert_eq!(morph_position(position, 64.0, 16, 0.0), Vec2::new(12.0, 20.0));
        assert_eq!(morph_position(position, 64.0, 16, 1.0), Vec2::new(8.0, 16.0));
        assert_eq!(morph_position(position, 64.0, 16, 0.5), Vec2::new(10.0, 18.0));
    }

    #[test]
    fn edge_vertices_match_coarser_neighbour() {
        // a tile bordering a neighbour of twice its scale on the right
        let fine = Tile::new(Vec2::new(-64.0, 0.0), 64.0, EdgeMask::RIGHT, 16);
        let coarse = Tile::new(Vec2::new(0.0, 0.0), 128.0, EdgeMask::NONE, 16);

        for i in 0..=16 {
            let y = i as f32 / 16.0;
            let fine_vertex = fine.vertex_position(Vec2::new(1.0, y), Vec2::ZERO);

            // every morphed edge vertex lies on a vertex row of the coarse tile
            let row = fine_vertex.y / coarse.grid_step();
            assert_eq!(row, row.floor(), "vertex {fine_vertex} is off the coarse grid");
            assert_eq!(fine_vertex.x, 0.0);
        }
    }

    #[test]
    fn sample_step_follows_the_morph() {
        let tile = Tile::new(Vec2::ZERO, 64.0, EdgeMask::RIGHT, 16);

        assert_eq!(tile.sample_step(Vec2::new(0.5, 0.5)), 4.0);
        assert_eq!(tile.sample_step(Vec2::new(1.0, 0.5)), 8.0);
        assert_eq!(tile.sample_step(Vec2::new(0.0, 0.5)), 4.0);
    }

    #[test]
    fn footprint() {
        let tile = Tile::new(Vec2::new(-16.0, 8.0), 8.0, EdgeMask::TOP, 4);
        let rect = tile.footprint();

        assert_eq!(rect.min, Vec2::new(-16.0, 8.0));
        assert_eq!(rect.max, Vec2::new(-8.0, 16.0));
        assert_eq!(tile.grid_step(), 2.0);
    }

    #[test]
    fn uniform_carries_placement() {
        let tile = Tile::new(Vec2::new(-16.0, 8.0), 8.0, EdgeMask::TOP | EdgeMask::LEFT, 4);
        let uniform = tile.uniform(Vec2::new(1.0, 2.0), Vec3::Z);

        assert_eq!(uniform.global_offset, Vec2::new(1.0, 2.0));
        assert_eq!(uniform.tile_offset, tile.origin);
        assert_eq!(uniform.scale, 8.0);
        assert_eq!(uniform.resolution, 4.0);
        assert_eq!(uniform.edge_morph, 3);
        assert_eq!(uniform.light_position, Vec3::Z);
    }
}
