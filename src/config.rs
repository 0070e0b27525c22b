//! Controller configuration components.
//!
//! This module defines the tuning for actor controllers: how many rays are
//! cast, which slopes can be climbed or descended, which layers are solid and
//! how long a platform drop-through lasts.

use bevy::prelude::*;
use thiserror::Error;

use crate::collision::CollisionLayers;
use crate::geometry::RayCounts;

/// Reasons a configuration is rejected by [`ControllerConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("max climb angle must be finite and within [0, 90) degrees, got {0}")]
    ClimbAngle(f32),
    #[error("max descend angle must be finite and within [0, 90) degrees, got {0}")]
    DescendAngle(f32),
    #[error("fall-through duration must be finite and non-negative, got {0}")]
    FallThroughDuration(f32),
    #[error("platform velocity must be finite, got {0}")]
    PlatformVelocity(Vec2),
}

/// Tuning for an actor's collision resolver.
///
/// Angles are in degrees, measured between the surface normal and world up.
///
/// # Example
///
/// ```rust
/// use raycast_controller2d::prelude::*;
///
/// let config = ControllerConfig::default()
///     .with_ray_counts(6, 3)
///     .with_max_climb_angle(60.0);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.rays.horizontal, 6);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerConfig {
    /// Number of rays cast per edge. Counts below two are raised to two.
    pub rays: RayCounts,
    /// Steepest slope that can be walked up. Steeper surfaces are walls.
    pub max_climb_angle: f32,
    /// Steepest slope the actor stays glued to when walking down.
    pub max_descend_angle: f32,
    /// Layers treated as collision targets.
    #[reflect(ignore)]
    pub collision_mask: CollisionLayers,
    /// Seconds one-way platforms are ignored after a drop-through starts.
    pub fall_through_duration: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            rays: RayCounts::default(),
            max_climb_angle: 80.0,
            max_descend_angle: 75.0,
            collision_mask: CollisionLayers::ENVIRONMENT,
            fall_through_duration: 0.5,
        }
    }
}

impl ControllerConfig {
    /// Player preset: denser horizontal rays for tall sprites.
    pub fn player() -> Self {
        Self {
            rays: RayCounts::new(6, 4),
            ..default()
        }
    }

    /// Set the number of horizontal and vertical rays.
    pub fn with_ray_counts(mut self, horizontal: usize, vertical: usize) -> Self {
        self.rays = RayCounts::new(horizontal, vertical);
        self
    }

    /// Set the steepest climbable slope in degrees.
    pub fn with_max_climb_angle(mut self, degrees: f32) -> Self {
        self.max_climb_angle = degrees;
        self
    }

    /// Set the steepest slope followed when walking down, in degrees.
    pub fn with_max_descend_angle(mut self, degrees: f32) -> Self {
        self.max_descend_angle = degrees;
        self
    }

    /// Set which layers block the actor.
    pub fn with_collision_mask(mut self, mask: CollisionLayers) -> Self {
        self.collision_mask = mask;
        self
    }

    /// Set how long a drop-through ignores one-way platforms.
    pub fn with_fall_through_duration(mut self, seconds: f32) -> Self {
        self.fall_through_duration = seconds;
        self
    }

    /// Check that angles and durations are usable.
    ///
    /// The resolver never panics on a bad config, but the results are
    /// meaningless; the plugin logs the error when such a config is added.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_angle(self.max_climb_angle) {
            return Err(ConfigError::ClimbAngle(self.max_climb_angle));
        }
        if !valid_angle(self.max_descend_angle) {
            return Err(ConfigError::DescendAngle(self.max_descend_angle));
        }
        if !self.fall_through_duration.is_finite() || self.fall_through_duration < 0.0 {
            return Err(ConfigError::FallThroughDuration(self.fall_through_duration));
        }
        Ok(())
    }
}

fn valid_angle(degrees: f32) -> bool {
    degrees.is_finite() && (0.0..90.0).contains(&degrees)
}
