use bevy::{
    core_pipeline::bloom::Bloom,
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
};
use bevy_ring_terrain::prelude::*;
use std::path::Path;

const CONFIG_PATH: &str = "assets/terrain.ron";
const SKY_COLOR: Color = Color::srgb(0.32, 0.16, 0.42);

fn main() -> anyhow::Result<()> {
    let config = if Path::new(CONFIG_PATH).exists() {
        TerrainConfig::load(CONFIG_PATH)?
    } else {
        TerrainConfig::default()
    };
    config.validate()?;

    let light_position = config.light_position;

    App::new()
        .insert_resource(ClearColor(SKY_COLOR))
        .add_plugins((
            DefaultPlugins,
            TerrainPlugin::new(config),
            TerrainDebugPlugin,
        ))
        .add_systems(Startup, move |commands: Commands| {
            setup(commands, light_position)
        })
        .run();

    Ok(())
}

fn setup(mut commands: Commands, light_position: Vec3) {
    // fly above the highest peaks instead of the default altitude
    let flight = CircularFlight {
        altitude: 2000.0,
        ..default()
    };

    commands.spawn((
        Name::new("View"),
        TerrainView,
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            far: 40000.0,
            ..default()
        }),
        Bloom::NATURAL,
        DistanceFog {
            color: SKY_COLOR,
            falloff: FogFalloff::Linear {
                start: 4000.0,
                end: 30000.0,
            },
            ..default()
        },
        flight.transform(),
        flight,
    ));

    commands.spawn((
        Name::new("Sun"),
        TerrainLight,
        DirectionalLight::default(),
        Transform::from_translation(light_position).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
