//! Moving platforms and their passengers.
//!
//! A platform never resolves its own collisions. Each step it looks for
//! actors it is about to carry or push, hands every one of them a forced
//! displacement, and moves. Passengers are moved by their own
//! [`Controller2D`](crate::controller::Controller2D) so they still collide
//! with the rest of the scene.
//!
//! Order within a step:
//! 1. [`PlatformController::compute_passenger_moves`]
//! 2. apply every record with `move_before_platform`
//! 3. translate the platform
//! 4. apply the remaining records

use bevy::ecs::entity::EntityHashSet;
use bevy::prelude::*;

use crate::backend::RayCaster;
use crate::collision::CollisionLayers;
use crate::config::ConfigError;
use crate::geometry::{direction, BoundingBox, RayCounts, RayOrigins, RaySpacing, SKIN_WIDTH};

/// A kinematic platform that carries actors.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use raycast_controller2d::prelude::*;
///
/// let platform = PlatformController::new(Vec2::new(2.0, 0.0))
///     .with_passenger_mask(CollisionLayers::ACTORS)
///     .with_ray_counts(6, 6);
///
/// assert!(platform.validate().is_ok());
/// assert_eq!(platform.displacement(0.5), Vec2::new(1.0, 0.0));
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct PlatformController {
    /// Movement in units per second.
    pub velocity: Vec2,
    /// Layers that count as passengers.
    #[reflect(ignore)]
    pub passenger_mask: CollisionLayers,
    pub rays: RayCounts,
}

impl Default for PlatformController {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            passenger_mask: CollisionLayers::ACTORS,
            rays: RayCounts::default(),
        }
    }
}

impl PlatformController {
    pub fn new(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..default()
        }
    }

    pub fn with_passenger_mask(mut self, mask: CollisionLayers) -> Self {
        self.passenger_mask = mask;
        self
    }

    pub fn with_ray_counts(mut self, horizontal: usize, vertical: usize) -> Self {
        self.rays = RayCounts::new(horizontal, vertical);
        self
    }

    /// Displacement for a step of `dt` seconds.
    pub fn displacement(&self, dt: f32) -> Vec2 {
        self.velocity * dt
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.velocity.is_finite() {
            return Err(ConfigError::PlatformVelocity(self.velocity));
        }
        Ok(())
    }

    /// Find the actors affected by moving the platform `bounds` by
    /// `velocity` this step, and how each of them has to move.
    ///
    /// `caster` must not report the platform itself. Every passenger gets at
    /// most one record; the first pass to find it wins. Passes, in order:
    ///
    /// - vertical motion: actors above (moving up) or below (moving down)
    ///   are pushed along, before the platform moves;
    /// - horizontal motion: actors in the way are shoved sideways, before the
    ///   platform moves;
    /// - moving down or purely sideways: actors resting on top are carried
    ///   by the full displacement, after the platform moves.
    pub fn compute_passenger_moves<C: RayCaster + ?Sized>(
        &self,
        caster: &C,
        bounds: &BoundingBox,
        velocity: Vec2,
    ) -> Vec<PassengerMovement> {
        let origins = RayOrigins::from_bounds(bounds);
        let spacing = RaySpacing::compute(bounds, self.rays);
        let mut moved = EntityHashSet::default();
        let mut moves = Vec::new();

        let direction_x = direction(velocity.x);
        let direction_y = direction(velocity.y);

        if velocity.y != 0.0 {
            let ray_length = velocity.y.abs() + SKIN_WIDTH;

            for i in 0..spacing.counts.vertical {
                let origin = origins.vertical_leading(direction_y)
                    + Vec2::X * (spacing.vertical * i as f32);
                let Some(hit) = caster.cast_ray(
                    origin,
                    Vec2::Y * direction_y,
                    ray_length,
                    self.passenger_mask,
                ) else {
                    continue;
                };
                let Some(entity) = hit.entity else {
                    continue;
                };
                if !moved.insert(entity) {
                    continue;
                }

                let push_x = if direction_y > 0.0 { velocity.x } else { 0.0 };
                let push_y = velocity.y - (hit.distance - SKIN_WIDTH) * direction_y;
                moves.push(PassengerMovement {
                    entity,
                    velocity: Vec2::new(push_x, push_y),
                    standing_on_platform: direction_y > 0.0,
                    move_before_platform: true,
                });
            }
        }

        if velocity.x != 0.0 {
            let ray_length = velocity.x.abs() + SKIN_WIDTH;

            for i in 0..spacing.counts.horizontal {
                let origin = origins.bottom_leading(direction_x)
                    + Vec2::Y * (spacing.horizontal * i as f32);
                let Some(hit) = caster.cast_ray(
                    origin,
                    Vec2::X * direction_x,
                    ray_length,
                    self.passenger_mask,
                ) else {
                    continue;
                };
                let Some(entity) = hit.entity else {
                    continue;
                };
                if !moved.insert(entity) {
                    continue;
                }

                let push_x = velocity.x - (hit.distance - SKIN_WIDTH) * direction_x;
                // Slight downward push so the passenger's vertical rays run.
                let push_y = -SKIN_WIDTH;
                moves.push(PassengerMovement {
                    entity,
                    velocity: Vec2::new(push_x, push_y),
                    standing_on_platform: false,
                    move_before_platform: true,
                });
            }
        }

        if direction_y < 0.0 || (velocity.y == 0.0 && velocity.x != 0.0) {
            let ray_length = SKIN_WIDTH * 2.0;

            for i in 0..spacing.counts.vertical {
                let origin = origins.top_left + Vec2::X * (spacing.vertical * i as f32);
                let Some(hit) =
                    caster.cast_ray(origin, Vec2::Y, ray_length, self.passenger_mask)
                else {
                    continue;
                };
                let Some(entity) = hit.entity else {
                    continue;
                };
                if !moved.insert(entity) {
                    continue;
                }

                moves.push(PassengerMovement {
                    entity,
                    velocity,
                    standing_on_platform: true,
                    move_before_platform: false,
                });
            }
        }

        if !moves.is_empty() {
            debug!("platform moving {velocity:?} affects {} passengers", moves.len());
        }
        moves
    }
}

/// Forced displacement of one passenger for one platform step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassengerMovement {
    pub entity: Entity,
    /// Displacement handed to the passenger's resolver.
    pub velocity: Vec2,
    /// The passenger rides on top and counts as grounded.
    pub standing_on_platform: bool,
    /// Apply before the platform translates instead of after.
    pub move_before_platform: bool,
}

/// Call `apply` for every record in the requested bucket, in detection order.
pub fn apply_passenger_moves(
    moves: &[PassengerMovement],
    before_platform: bool,
    mut apply: impl FnMut(&PassengerMovement),
) {
    moves
        .iter()
        .filter(|passenger| passenger.move_before_platform == before_platform)
        .for_each(|passenger| apply(passenger));
}
