use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
    },
};
use itertools::iproduct;

#[inline]
fn add_quad(indices: &mut Vec<u32>, a: u32, b: u32, c: u32, d: u32) {
    indices.extend_from_slice(&[a, b, c, a, c, d]);
}

/// Local unit quad coordinates, the origin sits in the corner rather than in the center.
fn generate_positions(resolution: u32) -> Vec<[f32; 3]> {
    iproduct!(0..=resolution, 0..=resolution)
        .map(|(y, x)| [x as f32 / resolution as f32, y as f32 / resolution as f32, 0.0])
        .collect()
}

fn generate_indices(resolution: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(resolution as usize * resolution as usize * 6);

    for i in iproduct!(0..resolution, 0..resolution).map(|(y, x)| x + y * (resolution + 1)) {
        add_quad(
            &mut indices,
            i,
            i + resolution + 1,
            i + resolution + 2,
            i + 1,
        );
    }

    indices
}

/// The geometry shared by every tile of a terrain.
///
/// The vertex positions hold the local unit quad coordinate in `x` and `y`;
/// the shading stage maps them onto the ground plane.
pub fn tile_mesh(resolution: u32) -> Mesh {
    let positions = generate_positions(resolution);
    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    let uvs: Vec<[f32; 2]> = positions.iter().map(|&[x, y, _]| [x, y]).collect();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_indices(Indices::U32(generate_indices(resolution)))
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
}
