//! A debug resource and systems controlling it, to visualize the morph factor and the scale of
//! the tiles.
use crate::{material::TerrainMaterial, plugin::TerrainTiles};
use bevy::prelude::*;
use bitflags::bitflags;

bitflags! {
    /// Mirrors the debug constants of the terrain shader.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TerrainDebugFlags: u32 {
        const SHOW_MORPH = 1 << 0;
        const SHOW_SCALE = 1 << 1;
    }
}

/// Adds the terrain debug config and the systems toggling it.
pub struct TerrainDebugPlugin;

impl Plugin for TerrainDebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TerrainDebug>()
            .add_systems(Update, (toggle_debug, apply_debug_flags).chain());
    }
}

#[derive(Clone, Debug, Default, Resource)]
pub struct TerrainDebug {
    pub show_morph: bool,
    pub show_scale: bool,
}

impl TerrainDebug {
    pub fn flags(&self) -> TerrainDebugFlags {
        let mut flags = TerrainDebugFlags::empty();
        flags.set(TerrainDebugFlags::SHOW_MORPH, self.show_morph);
        flags.set(TerrainDebugFlags::SHOW_SCALE, self.show_scale);
        flags
    }
}

pub fn toggle_debug(input: Res<ButtonInput<KeyCode>>, mut debug: ResMut<TerrainDebug>) {
    if input.just_pressed(KeyCode::KeyM) {
        debug.show_morph = !debug.show_morph;
        println!(
            "Toggled the morph view {}.",
            if debug.show_morph { "on" } else { "off" }
        )
    }
    if input.just_pressed(KeyCode::KeyL) {
        debug.show_scale = !debug.show_scale;
        println!(
            "Toggled the scale view {}.",
            if debug.show_scale { "on" } else { "off" }
        )
    }
}

/// Writes the debug flags into every tile material that does not carry them yet.
pub fn apply_debug_flags(
    debug: Res<TerrainDebug>,
    terrains: Query<&TerrainTiles>,
    mut materials: ResMut<Assets<TerrainMaterial>>,
) {
    let flags = debug.flags().bits();

    for handle in terrains.iter().flat_map(TerrainTiles::materials) {
        let outdated = materials
            .get(handle)
            .is_some_and(|material| material.tile.debug_flags != flags);

        if outdated {
            if let Some(material) = materials.get_mut(handle) {
                material.tile.debug_flags = flags;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_match_shader_constants() {
        let debug = TerrainDebug {
            show_morph: true,
            show_scale: true,
        };

        assert_eq!(TerrainDebug::default().flags().bits(), 0);
        assert_eq!(debug.flags().bits(), 3);
        assert_eq!(TerrainDebugFlags::SHOW_MORPH.bits(), 1);
        assert_eq!(TerrainDebugFlags::SHOW_SCALE.bits(), 2);
    }
}
