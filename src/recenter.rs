use bevy::prelude::*;

/// A flip of the global offset performed by [`RecenteringController::update_uniforms`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flip {
    /// The wrapped offset before it was negated.
    pub previous: Vec2,
    /// The offset that has to be pushed to every tile.
    pub offset: Vec2,
}

/// Keeps the offset applied to all tiles bounded, so that the terrain appears infinite without
/// ever growing the tile set or losing float precision far away from the origin.
///
/// The offset accumulates the planar travel of the view. Each frame it is wrapped
/// (not clamped) to half the world width and negated once its length reaches a sixteenth of
/// the world width.
#[derive(Clone, Debug)]
pub struct RecenteringController {
    world_width: f32,
    global_offset: Vec2,
    last_view_position: Option<Vec2>,
    flip_count: u64,
}

impl RecenteringController {
    pub fn new(world_width: f32) -> Self {
        Self {
            world_width,
            global_offset: Vec2::ZERO,
            last_view_position: None,
            flip_count: 0,
        }
    }

    #[inline]
    pub fn global_offset(&self) -> Vec2 {
        self.global_offset
    }

    #[inline]
    pub fn flip_count(&self) -> u64 {
        self.flip_count
    }

    /// The period of the modular wrap.
    #[inline]
    pub fn wrap_period(&self) -> f32 {
        self.world_width / 2.0
    }

    /// The offset length at which a flip is triggered.
    #[inline]
    pub fn flip_threshold(&self) -> f32 {
        self.world_width / 16.0
    }

    pub fn set_global_offset(&mut self, offset: Vec2) {
        self.global_offset = offset;
    }

    pub fn accumulate(&mut self, delta: Vec2) {
        self.global_offset += delta;
    }

    /// Accumulates the planar displacement of the view since the previous call.
    ///
    /// The ground plane spans the world x and z axes.
    pub fn follow(&mut self, view_position: Vec3) {
        let position = view_position.xz();

        if let Some(last) = self.last_view_position.replace(position) {
            self.accumulate(position - last);
        }
    }

    /// Wraps the offset and flips it if it grew too large.
    ///
    /// Has to be called exactly once per frame, after the view transform is final.
    pub fn update_uniforms(&mut self) -> Option<Flip> {
        let period = self.wrap_period();
        self.global_offset = Vec2::new(
            self.global_offset.x % period,
            self.global_offset.y % period,
        );

        if self.global_offset.length() < self.flip_threshold() {
            return None;
        }

        let previous = self.global_offset;
        self.global_offset = -previous;
        self.flip_count += 1;

        Some(Flip {
            previous,
            offset: self.global_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD_WIDTH: f32 = 65536.0;

    #[test]
    fn flips_at_threshold() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);
        controller.set_global_offset(Vec2::new(WORLD_WIDTH / 16.0, 0.0));

        let flip = controller.update_uniforms().unwrap();

        assert_eq!(flip.previous, Vec2::new(4096.0, 0.0));
        assert_eq!(flip.offset, Vec2::new(-4096.0, 0.0));
        assert_eq!(controller.global_offset(), flip.offset);
        assert_eq!(controller.flip_count(), 1);
    }

    #[test]
    fn does_not_flip_below_threshold() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);
        let offset = Vec2::new(WORLD_WIDTH / 16.0 - 0.5, 0.0);
        controller.set_global_offset(offset);

        assert_eq!(controller.update_uniforms(), None);
        assert_eq!(controller.global_offset(), offset);
        assert_eq!(controller.flip_count(), 0);
    }

    #[test]
    fn flip_negates_wrapped_offset() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);
        // 40000 wraps to 7232, -70000 wraps to -4464
        controller.set_global_offset(Vec2::new(40000.0, -70000.0));

        let flip = controller.update_uniforms().unwrap();

        assert_eq!(flip.previous, Vec2::new(7232.0, -4464.0));
        assert_eq!(flip.offset, -flip.previous);
    }

    #[test]
    fn wrap_keeps_offset_bounded() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);

        for _ in 0..10_000 {
            controller.accumulate(Vec2::new(977.0, -1313.0));
            controller.update_uniforms();

            let offset = controller.global_offset();
            assert!(offset.x.abs() < controller.wrap_period());
            assert!(offset.y.abs() < controller.wrap_period());
        }

        assert!(controller.flip_count() > 0);
    }

    #[test]
    fn diagonal_distance_triggers_flip() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);
        // each component is below the threshold, the length is not
        controller.set_global_offset(Vec2::new(3000.0, 3000.0));

        assert!(controller.update_uniforms().is_some());
    }

    #[test]
    fn follow_accumulates_planar_travel() {
        let mut controller = RecenteringController::new(WORLD_WIDTH);

        controller.follow(Vec3::new(100.0, 800.0, 50.0));
        assert_eq!(controller.global_offset(), Vec2::ZERO);

        controller.follow(Vec3::new(130.0, 900.0, 10.0));
        controller.follow(Vec3::new(140.0, 0.0, 20.0));
        assert_eq!(controller.global_offset(), Vec2::new(40.0, -30.0));
    }
}
