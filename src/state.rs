//! Collision report and state marker components.
//!
//! [`CollisionInfo`] is the per-step output of the collision resolver. The
//! marker components mirror it so gameplay systems can filter queries with
//! `With<Grounded>` and friends; they are kept in sync by
//! [`sync_state_markers`](crate::systems::sync_state_markers).

use bevy::prelude::*;

/// What the last move of an actor touched.
///
/// Reset at the start of every move, except for the drop-through state,
/// which expires on its own deadline.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionInfo {
    pub above: bool,
    pub below: bool,
    pub left: bool,
    pub right: bool,
    pub climbing_slope: bool,
    pub descending_slope: bool,
    /// Slope angle in degrees found during this move (0 = flat).
    pub slope_angle: f32,
    /// Slope angle of the previous move.
    pub slope_angle_old: f32,
    /// Displacement requested for this move, before any correction.
    pub velocity_old: Vec2,
    /// Elapsed time (seconds) at which an active drop-through ends.
    pub(crate) fall_through_until: Option<f32>,
}

impl CollisionInfo {
    /// Start a new move: carry the slope angle over and clear contacts.
    pub fn reset(&mut self) {
        self.above = false;
        self.below = false;
        self.left = false;
        self.right = false;
        self.climbing_slope = false;
        self.descending_slope = false;
        self.slope_angle_old = self.slope_angle;
        self.slope_angle = 0.0;
    }

    /// Whether one-way platforms are currently being dropped through.
    pub fn falling_through_platform(&self) -> bool {
        self.fall_through_until.is_some()
    }

    /// Elapsed time at which the current drop-through ends, if any.
    pub fn fall_through_deadline(&self) -> Option<f32> {
        self.fall_through_until
    }

    /// Begin ignoring one-way platforms until `until`.
    pub(crate) fn start_fall_through(&mut self, until: f32) {
        self.fall_through_until = Some(until);
    }

    /// Clear the drop-through once `now` reaches its deadline.
    ///
    /// Returns `true` when the drop-through ended on this call.
    pub(crate) fn expire_fall_through(&mut self, now: f32) -> bool {
        match self.fall_through_until {
            Some(until) if now >= until => {
                self.fall_through_until = None;
                true
            }
            _ => false,
        }
    }

    /// Touching a wall on either side.
    pub fn touching_wall(&self) -> bool {
        self.left || self.right
    }

    /// Side of the wall being touched: -1 left, 1 right, 0 none.
    pub fn wall_direction(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Marker component indicating the actor is standing on something.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the actor is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the actor bumped its head.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct TouchingCeiling;

/// Marker component indicating the actor is touching a wall.
///
/// Contains the horizontal direction to the wall.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Direction from the actor to the wall (-1 left, 1 right).
    pub direction: f32,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self { direction: 1.0 }
    }
}

impl TouchingWall {
    /// Create a new wall touch state.
    pub fn new(direction: f32) -> Self {
        Self { direction }
    }

    /// Check if the wall is on the left side.
    pub fn is_left(&self) -> bool {
        self.direction < 0.0
    }

    /// Check if the wall is on the right side.
    pub fn is_right(&self) -> bool {
        self.direction > 0.0
    }
}
