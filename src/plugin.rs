use crate::{
    backend::{check_render_backend, RenderBackendInfo},
    config::TerrainConfig,
    flight::{fly_circular_path, limit_frame_delta},
    material::TerrainMaterial,
    mesh::tile_mesh,
    shaders::load_terrain_shaders,
    terrain::Terrain,
};
use bevy::{
    pbr::{NotShadowCaster, NotShadowReceiver},
    prelude::*,
    render::view::NoFrustumCulling,
};

/// The view the terrain recenters around.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct TerrainView;

/// The light whose position is threaded into the parameter block of every tile.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct TerrainLight;

/// The index of a tile entity within the tiles of its terrain.
#[derive(Component, Clone, Copy, Debug)]
pub struct TerrainTile {
    pub index: usize,
}

/// The drawables of a terrain, in tile order.
#[derive(Component, Clone, Debug, Default)]
pub struct TerrainTiles(Vec<(Entity, Handle<TerrainMaterial>)>);

impl TerrainTiles {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&(Entity, Handle<TerrainMaterial>)> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Entity, Handle<TerrainMaterial>)> {
        self.0.iter()
    }

    pub fn materials(&self) -> impl Iterator<Item = &Handle<TerrainMaterial>> {
        self.0.iter().map(|(_, material)| material)
    }
}

/// Sets up the terrain described by the config and keeps it centered around the [`TerrainView`].
#[derive(Default)]
pub struct TerrainPlugin {
    pub config: TerrainConfig,
}

impl TerrainPlugin {
    pub fn new(config: TerrainConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        load_terrain_shaders(app);

        app.add_plugins(MaterialPlugin::<TerrainMaterial>::default())
            .insert_resource(self.config.clone());

        add_terrain_systems(app);
    }

    fn finish(&self, app: &mut App) {
        match check_render_backend(app.world(), &self.config.height_field) {
            Ok(backend) => {
                info!(
                    "initializing terrain resources on {} ({})",
                    backend.adapter_name, backend.backend
                );
                app.insert_resource(backend);
            }
            Err(error) => {
                error!("{error}. Falling back to an empty scene, the terrain will not be drawn.")
            }
        }
    }
}

/// Schedules the terrain systems that do not depend on the render world.
///
/// The recentering and the light both read global transforms, so they run after propagation.
pub(crate) fn add_terrain_systems(app: &mut App) {
    app.add_systems(
        Startup,
        (
            limit_frame_delta,
            spawn_terrain.run_if(resource_exists::<RenderBackendInfo>),
        ),
    )
    .add_systems(Update, fly_circular_path)
    .add_systems(
        PostUpdate,
        (recenter_terrain, sync_terrain_light)
            .after(TransformSystem::TransformPropagate)
            .run_if(resource_exists::<RenderBackendInfo>),
    );
}

/// Builds the terrain from the config and spawns one drawable per tile.
///
/// All tiles share the same mesh and height field image, but own their material.
pub fn spawn_terrain(
    mut commands: Commands,
    config: Res<TerrainConfig>,
    backend: Res<RenderBackendInfo>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<TerrainMaterial>>,
) {
    let terrain = Terrain::from_config(config.clone()).and_then(|terrain| {
        backend.supports_height_field(terrain.height_field().size())?;
        Ok(terrain)
    });

    let terrain = match terrain {
        Ok(terrain) => terrain,
        Err(error) => {
            error!("Failed to build the terrain: {error}");
            return;
        }
    };

    let mesh = meshes.add(tile_mesh(config.resolution));
    let height_field = images.add(terrain.height_field().to_image());

    let root = commands
        .spawn((Name::new("Terrain"), Transform::default(), Visibility::default()))
        .id();

    let tiles = terrain
        .tile_uniforms(config.light_position)
        .enumerate()
        .map(|(index, uniform)| {
            let material = materials.add(TerrainMaterial::new(uniform, height_field.clone()));

            let entity = commands
                .spawn((
                    TerrainTile { index },
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material.clone()),
                    NoFrustumCulling,
                    NotShadowCaster,
                    NotShadowReceiver,
                ))
                .set_parent(root)
                .id();

            (entity, material)
        })
        .collect();

    commands
        .entity(root)
        .insert((terrain, TerrainTiles(tiles)));
}

/// Follows the view and pushes the new global offset to every tile once it flipped.
///
/// Runs after transform propagation, so that the view position of this frame is final.
pub fn recenter_terrain(
    views: Query<&GlobalTransform, With<TerrainView>>,
    mut terrains: Query<(&mut Terrain, &TerrainTiles)>,
    mut materials: ResMut<Assets<TerrainMaterial>>,
) {
    let Ok(view) = views.get_single() else {
        return;
    };

    for (mut terrain, tiles) in &mut terrains {
        terrain.follow(view.translation());

        let Some(flip) = terrain.update_uniforms() else {
            continue;
        };

        for handle in tiles.materials() {
            if let Some(material) = materials.get_mut(handle) {
                material.tile.global_offset = flip.offset;
            }
        }
    }
}

pub fn sync_terrain_light(
    lights: Query<&GlobalTransform, (With<TerrainLight>, Changed<GlobalTransform>)>,
    terrains: Query<&TerrainTiles>,
    mut materials: ResMut<Assets<TerrainMaterial>>,
) {
    let Ok(light) = lights.get_single() else {
        return;
    };

    let light_position = light.translation();

    for handle in terrains.iter().flat_map(TerrainTiles::materials) {
        if let Some(material) = materials.get_mut(handle) {
            material.tile.light_position = light_position;
        }
    }
}
