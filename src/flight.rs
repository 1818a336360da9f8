use bevy::prelude::*;
use std::f32::consts::TAU;

/// The largest frame delta any terrain system advances by.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 60.0;

#[inline]
pub fn clamp_frame_delta(delta: f32) -> f32 {
    delta.clamp(0.0, MAX_FRAME_DELTA)
}

/// Flies an entity along a horizontal circle around the world origin,
/// looking at a point below the center of the circle.
#[derive(Component, Clone, Debug)]
pub struct CircularFlight {
    pub radius: f32,
    /// Radians per second.
    pub angular_speed: f32,
    pub altitude: f32,
    /// How far below the circle the look-at point lies.
    pub look_depth: f32,
    pub angle: f32,
}

impl Default for CircularFlight {
    fn default() -> Self {
        Self {
            radius: 7300.0,
            angular_speed: 0.1,
            altitude: 800.0,
            look_depth: 800.0,
            angle: 0.0,
        }
    }
}

impl CircularFlight {
    pub fn advance(&mut self, delta: f32) {
        self.angle = (self.angle + self.angular_speed * clamp_frame_delta(delta)) % TAU;
    }

    pub fn position(&self) -> Vec3 {
        let (sin, cos) = self.angle.sin_cos();
        Vec3::new(self.radius * cos, self.altitude, self.radius * sin)
    }

    pub fn target(&self) -> Vec3 {
        Vec3::new(0.0, self.altitude - self.look_depth, 0.0)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target(), Vec3::Y)
    }
}

pub fn fly_circular_path(
    time: Res<Time<Virtual>>,
    mut flights: Query<(&mut CircularFlight, &mut Transform)>,
) {
    for (mut flight, mut transform) in &mut flights {
        flight.advance(time.delta_secs());
        *transform = flight.transform();
    }
}

pub(crate) fn limit_frame_delta(mut time: ResMut<Time<Virtual>>) {
    time.set_max_delta(std::time::Duration::from_secs_f32(MAX_FRAME_DELTA));
}
