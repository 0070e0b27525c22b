//! Platformer motion driver.
//!
//! Turns [`PlatformerInput`] into a per-step displacement with jump-height
//! based gravity and smoothed horizontal acceleration. The controller only
//! resolves collisions; everything velocity related lives here.

use bevy::prelude::*;

use crate::controller::Controller2D;
use crate::intent::PlatformerInput;
use crate::state::CollisionInfo;

/// Velocity integration for a jumping, running actor.
///
/// Gravity and jump velocities are derived from the jump heights and the
/// time to the apex, so designers tune heights instead of forces.
///
/// # Example
///
/// ```rust
/// use raycast_controller2d::prelude::*;
///
/// let motion = PlatformerMotion::default();
/// assert!((motion.gravity() - -50.0).abs() < 1e-3);
/// assert!((motion.max_jump_velocity() - 20.0).abs() < 1e-3);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[require(Controller2D, PlatformerInput)]
pub struct PlatformerMotion {
    /// Apex height of a held jump.
    pub max_jump_height: f32,
    /// Apex height of a tapped jump.
    pub min_jump_height: f32,
    /// Seconds from take-off to the apex of a held jump.
    pub time_to_jump_apex: f32,
    /// Horizontal speed at full input, units per second.
    pub move_speed: f32,
    /// Smoothing time of horizontal speed changes on the ground.
    pub acceleration_time_grounded: f32,
    /// Smoothing time of horizontal speed changes in the air.
    pub acceleration_time_airborne: f32,
    /// Current velocity, units per second.
    pub velocity: Vec2,
    velocity_x_smoothing: f32,
}

impl Default for PlatformerMotion {
    fn default() -> Self {
        Self {
            max_jump_height: 4.0,
            min_jump_height: 1.0,
            time_to_jump_apex: 0.4,
            move_speed: 6.0,
            acceleration_time_grounded: 0.1,
            acceleration_time_airborne: 0.2,
            velocity: Vec2::ZERO,
            velocity_x_smoothing: 0.0,
        }
    }
}

impl PlatformerMotion {
    pub fn with_jump_heights(mut self, min: f32, max: f32) -> Self {
        self.min_jump_height = min;
        self.max_jump_height = max;
        self
    }

    pub fn with_time_to_jump_apex(mut self, seconds: f32) -> Self {
        self.time_to_jump_apex = seconds;
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Vertical acceleration, negative.
    pub fn gravity(&self) -> f32 {
        -(2.0 * self.max_jump_height) / self.time_to_jump_apex.powi(2)
    }

    /// Take-off speed of a held jump.
    pub fn max_jump_velocity(&self) -> f32 {
        (self.gravity() * self.time_to_jump_apex).abs()
    }

    /// Upward speed a released jump is cut to.
    pub fn min_jump_velocity(&self) -> f32 {
        (2.0 * self.gravity().abs() * self.min_jump_height).sqrt()
    }

    /// Stop vertical motion after a move that hit a floor or ceiling.
    pub fn apply_collisions(&mut self, collisions: &CollisionInfo) {
        if collisions.above || collisions.below {
            self.velocity.y = 0.0;
        }
    }

    /// Integrate one step of `dt` seconds and return the displacement to
    /// resolve. `collisions` is the report of the previous move.
    pub fn step(
        &mut self,
        input: &mut PlatformerInput,
        collisions: &CollisionInfo,
        dt: f32,
    ) -> Vec2 {
        let (jump_pressed, jump_released) = input.jump_edges();

        if jump_pressed && collisions.below {
            self.velocity.y = self.max_jump_velocity();
        }
        if jump_released {
            self.velocity.y = self.velocity.y.min(self.min_jump_velocity());
        }

        let target_velocity_x = input.axis.x * self.move_speed;
        let smooth_time = if collisions.below {
            self.acceleration_time_grounded
        } else {
            self.acceleration_time_airborne
        };
        self.velocity.x = smooth_damp(
            self.velocity.x,
            target_velocity_x,
            &mut self.velocity_x_smoothing,
            smooth_time,
            dt,
        );
        self.velocity.y += self.gravity() * dt;

        self.velocity * dt
    }
}

/// Critically damped approach of `current` towards `target`.
///
/// `rate` carries the rate of change between calls. Never overshoots.
pub fn smooth_damp(current: f32, target: f32, rate: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*rate + omega * change) * dt;
    *rate = (*rate - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *rate = 0.0;
    }
    output
}
