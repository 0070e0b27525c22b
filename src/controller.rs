//! Collision resolver for box actors.
//!
//! [`Controller2D`] takes the displacement an actor wants to make this step
//! and corrects it against the scene with parallel rays cast from the edges
//! of its box. Each move runs, in order:
//!
//! 1. a descend probe that glues the actor to slopes it walks down,
//! 2. a horizontal sweep that stops at walls and climbs shallow slopes,
//! 3. a vertical sweep from the already corrected horizontal position, which
//!    lands on floors, bumps ceilings and handles one-way platforms.
//!
//! The outcome is recorded in [`CollisionInfo`].

use bevy::prelude::*;

use crate::backend::RayCaster;
use crate::config::ControllerConfig;
use crate::geometry::{direction, BoundingBox, RayCounts, RayOrigins, RaySpacing, SKIN_WIDTH};
use crate::intent::MoveIntent;
use crate::state::CollisionInfo;

/// Per-actor resolver state.
///
/// Holds the collision report of the last move and the cached ray spacing.
/// Tuning lives in the [`ControllerConfig`] component next to it.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use raycast_controller2d::prelude::*;
///
/// let mut scene = StaticScene::new();
/// scene.add_box(
///     BoundingBox::from_size(Vec2::new(0.0, -2.0), Vec2::new(10.0, 1.0)),
///     CollisionLayers::TERRAIN,
/// );
///
/// let config = ControllerConfig::default();
/// let mut controller = Controller2D::new();
/// let mut bounds = BoundingBox::from_size(Vec2::ZERO, Vec2::ONE);
///
/// controller.move_box(&config, &scene, &mut bounds, Vec2::new(0.0, -5.0), Vec2::ZERO, false, 0.0);
///
/// assert!(controller.collisions.below);
/// assert!((bounds.min().y - -1.5).abs() < 1e-4);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
#[require(ControllerConfig, MoveIntent)]
pub struct Controller2D {
    /// Result of the last move.
    pub collisions: CollisionInfo,
    /// Directional input passed with the last move.
    pub player_input: Vec2,
    /// Spacing and the box size it was computed for.
    #[reflect(ignore)]
    spacing: Option<(Vec2, RaySpacing)>,
}

impl Controller2D {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ray spacing for `bounds`, recomputed only when the box size or the
    /// ray counts change.
    pub fn ray_spacing(&mut self, bounds: &BoundingBox, counts: RayCounts) -> RaySpacing {
        let size = bounds.size();
        match self.spacing {
            Some((cached_size, spacing))
                if cached_size == size && spacing.counts == counts.clamped() =>
            {
                spacing
            }
            _ => {
                let spacing = RaySpacing::compute(bounds, counts);
                self.spacing = Some((size, spacing));
                spacing
            }
        }
    }

    /// Resolve `velocity` (the displacement for this step) against the scene.
    ///
    /// Returns the corrected displacement; the caller applies it to the
    /// actor's position. `input` is the raw directional input, only used to
    /// detect a drop-through request (`input.y <= -1`). `now` is the elapsed
    /// time in seconds and drives the drop-through deadline.
    /// `standing_on_platform` marks the actor as grounded when a platform is
    /// carrying it.
    #[allow(clippy::too_many_arguments)]
    pub fn move_and_collide<C: RayCaster + ?Sized>(
        &mut self,
        config: &ControllerConfig,
        caster: &C,
        bounds: &BoundingBox,
        velocity: Vec2,
        input: Vec2,
        standing_on_platform: bool,
        now: f32,
    ) -> Vec2 {
        let spacing = self.ray_spacing(bounds, config.rays);

        if self.collisions.expire_fall_through(now) {
            debug!("drop-through ended at {now:.3}s");
        }
        self.collisions.reset();
        self.collisions.velocity_old = velocity;
        self.player_input = input;

        let mut velocity = velocity;
        let mut pass = ResolvePass {
            config,
            caster,
            origins: RayOrigins::from_bounds(bounds),
            spacing,
            collisions: &mut self.collisions,
            input,
            now,
        };

        if velocity.y < 0.0 {
            pass.descend_slope(&mut velocity);
        }
        if velocity.x != 0.0 {
            pass.horizontal_collisions(&mut velocity);
        }
        if velocity.y != 0.0 {
            pass.vertical_collisions(&mut velocity);
        }

        if standing_on_platform {
            self.collisions.below = true;
        }

        trace!(
            "resolved {:?} -> {:?} ({:?})",
            self.collisions.velocity_old,
            velocity,
            self.collisions
        );
        velocity
    }

    /// [`move_and_collide`](Self::move_and_collide), then translate `bounds`
    /// by the corrected displacement.
    #[allow(clippy::too_many_arguments)]
    pub fn move_box<C: RayCaster + ?Sized>(
        &mut self,
        config: &ControllerConfig,
        caster: &C,
        bounds: &mut BoundingBox,
        velocity: Vec2,
        input: Vec2,
        standing_on_platform: bool,
        now: f32,
    ) -> Vec2 {
        let velocity = self.move_and_collide(
            config,
            caster,
            bounds,
            velocity,
            input,
            standing_on_platform,
            now,
        );
        bounds.translate(velocity);
        velocity
    }

    /// Whether jumping is currently allowed.
    pub fn is_grounded(&self) -> bool {
        self.collisions.below
    }
}

/// Borrowed state for a single move.
struct ResolvePass<'a, C: ?Sized> {
    config: &'a ControllerConfig,
    caster: &'a C,
    origins: RayOrigins,
    spacing: RaySpacing,
    collisions: &'a mut CollisionInfo,
    input: Vec2,
    now: f32,
}

impl<C: RayCaster + ?Sized> ResolvePass<'_, C> {
    fn horizontal_collisions(&mut self, velocity: &mut Vec2) {
        let direction_x = direction(velocity.x);
        let mut ray_length = velocity.x.abs() + SKIN_WIDTH;

        for i in 0..self.spacing.counts.horizontal {
            let origin = self.origins.bottom_leading(direction_x)
                + Vec2::Y * (self.spacing.horizontal * i as f32);
            let Some(hit) = self.caster.cast_ray(
                origin,
                Vec2::X * direction_x,
                ray_length,
                self.config.collision_mask,
            ) else {
                continue;
            };

            // Already overlapping this collider.
            if hit.distance == 0.0 {
                continue;
            }

            let slope_angle = hit.slope_angle();

            if i == 0 && slope_angle <= self.config.max_climb_angle {
                if self.collisions.descending_slope {
                    self.collisions.descending_slope = false;
                    *velocity = self.collisions.velocity_old;
                }

                // Exact comparison: only a new slope snaps to its start.
                let mut distance_to_slope_start = 0.0;
                if slope_angle != self.collisions.slope_angle_old {
                    distance_to_slope_start = hit.distance - SKIN_WIDTH;
                    velocity.x -= distance_to_slope_start * direction_x;
                }

                climb_slope(velocity, slope_angle, self.collisions);
                velocity.x += distance_to_slope_start * direction_x;
            }

            if !self.collisions.climbing_slope || slope_angle > self.config.max_climb_angle {
                velocity.x = (hit.distance - SKIN_WIDTH) * direction_x;
                ray_length = hit.distance;

                if self.collisions.climbing_slope {
                    velocity.y =
                        self.collisions.slope_angle.to_radians().tan() * velocity.x.abs();
                }

                self.collisions.left = direction_x < 0.0;
                self.collisions.right = direction_x > 0.0;
            }
        }
    }

    fn vertical_collisions(&mut self, velocity: &mut Vec2) {
        let direction_y = direction(velocity.y);
        let mut ray_length = velocity.y.abs() + SKIN_WIDTH;

        for i in 0..self.spacing.counts.vertical {
            let origin = self.origins.vertical_leading(direction_y)
                + Vec2::X * (self.spacing.vertical * i as f32 + velocity.x);
            let Some(hit) = self.caster.cast_ray(
                origin,
                Vec2::Y * direction_y,
                ray_length,
                self.config.collision_mask,
            ) else {
                continue;
            };

            if hit.is_one_way() {
                if direction_y > 0.0 || hit.distance == 0.0 {
                    continue;
                }
                if self.collisions.falling_through_platform() {
                    continue;
                }
                if self.input.y <= -1.0 {
                    let until = self.now + self.config.fall_through_duration;
                    self.collisions.start_fall_through(until);
                    debug!("drop-through started, one-way platforms ignored until {until:.3}s");
                    continue;
                }
            }

            velocity.y = (hit.distance - SKIN_WIDTH) * direction_y;
            ray_length = hit.distance;

            if self.collisions.climbing_slope {
                velocity.x = velocity.y / self.collisions.slope_angle.to_radians().tan()
                    * direction(velocity.x);
            }

            self.collisions.below = direction_y < 0.0;
            self.collisions.above = direction_y > 0.0;
        }

        if self.collisions.climbing_slope {
            // The slope may change angle part way through the climb.
            let direction_x = direction(velocity.x);
            let ray_length = velocity.x.abs() + SKIN_WIDTH;
            let origin = self.origins.bottom_leading(direction_x) + Vec2::Y * velocity.y;

            if let Some(hit) = self.caster.cast_ray(
                origin,
                Vec2::X * direction_x,
                ray_length,
                self.config.collision_mask,
            ) {
                let slope_angle = hit.slope_angle();
                if slope_angle != self.collisions.slope_angle {
                    velocity.x = (hit.distance - SKIN_WIDTH) * direction_x;
                    self.collisions.slope_angle = slope_angle;
                }
            }
        }
    }

    fn descend_slope(&mut self, velocity: &mut Vec2) {
        let direction_x = direction(velocity.x);

        // Probe from the uphill corner, the one last to leave the slope.
        let origin = self.origins.bottom_leading(-direction_x);
        let Some(hit) = self.caster.cast_ray(
            origin,
            Vec2::NEG_Y,
            f32::MAX,
            self.config.collision_mask,
        ) else {
            return;
        };

        let slope_angle = hit.slope_angle();
        if slope_angle == 0.0 || slope_angle > self.config.max_descend_angle {
            return;
        }
        if direction(hit.normal.x) != direction_x {
            return;
        }

        let radians = slope_angle.to_radians();
        let move_distance = velocity.x.abs();
        if hit.distance - SKIN_WIDTH > radians.tan() * move_distance {
            return;
        }

        let descend_velocity_y = radians.sin() * move_distance;
        velocity.x = radians.cos() * move_distance * direction_x;
        velocity.y -= descend_velocity_y;

        self.collisions.slope_angle = slope_angle;
        self.collisions.descending_slope = true;
        self.collisions.below = true;
    }
}

/// Redirect horizontal motion up a slope of `slope_angle` degrees.
///
/// Leaves `velocity` alone when it already rises faster than the slope,
/// which is the case during a jump.
fn climb_slope(velocity: &mut Vec2, slope_angle: f32, collisions: &mut CollisionInfo) {
    let move_distance = velocity.x.abs();
    let radians = slope_angle.to_radians();
    let climb_velocity_y = radians.sin() * move_distance;

    if velocity.y <= climb_velocity_y {
        velocity.y = climb_velocity_y;
        velocity.x = radians.cos() * move_distance * direction(velocity.x);
        collisions.below = true;
        collisions.climbing_slope = true;
        collisions.slope_angle = slope_angle;
    }
}
