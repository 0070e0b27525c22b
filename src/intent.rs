//! Movement intent components.
//!
//! Intents carry what an actor wants to do this step. Gameplay code (or the
//! [`drive_platformers`](crate::systems::drive_platformers) system) writes
//! them; the backend's movement system consumes them and runs the resolver.

use bevy::prelude::*;

/// Displacement an actor wants to make on the next fixed step.
///
/// The displacement is in world units for one step, not per second.
/// A pending intent is consumed by exactly one move.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use raycast_controller2d::prelude::*;
///
/// let mut intent = MoveIntent::new();
/// intent.set_move(Vec2::new(0.1, -0.2), Vec2::new(1.0, 0.0));
/// assert!(intent.is_pending());
///
/// let (displacement, input) = intent.take().unwrap();
/// assert_eq!(displacement, Vec2::new(0.1, -0.2));
/// assert_eq!(input.x, 1.0);
/// assert!(!intent.is_pending());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MoveIntent {
    /// Requested displacement for the step.
    pub displacement: Vec2,
    /// Directional input, each axis in [-1, 1]. A `y` of -1 asks to drop
    /// through one-way platforms.
    pub input: Vec2,
    pending: bool,
}

impl MoveIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a move with directional input.
    pub fn set_move(&mut self, displacement: Vec2, input: Vec2) {
        self.displacement = displacement;
        self.input = input.clamp(Vec2::NEG_ONE, Vec2::ONE);
        self.pending = true;
    }

    /// Request a move without input.
    pub fn set_displacement(&mut self, displacement: Vec2) {
        self.set_move(displacement, Vec2::ZERO);
    }

    /// Whether a move is waiting to be resolved.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending move as `(displacement, input)`.
    pub fn take(&mut self) -> Option<(Vec2, Vec2)> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some((self.displacement, self.input))
    }

    /// Drop the pending move.
    pub fn clear(&mut self) {
        self.pending = false;
    }
}

/// Player or AI input for a [`PlatformerMotion`](crate::motion::PlatformerMotion).
///
/// Set it every frame; jump presses and releases are detected from the
/// change of [`jump_pressed`](Self::jump_pressed) between steps.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct PlatformerInput {
    /// Directional input, each axis in [-1, 1].
    pub axis: Vec2,
    /// Whether the jump action is held.
    pub jump_pressed: bool,
    /// Held state seen by the previous step (for edge detection).
    pub(crate) jump_pressed_prev: bool,
}

impl PlatformerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directional input, clamped to [-1, 1] per axis.
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Advance edge detection. Returns `(pressed_now, released_now)`.
    pub(crate) fn jump_edges(&mut self) -> (bool, bool) {
        let pressed = self.jump_pressed && !self.jump_pressed_prev;
        let released = !self.jump_pressed && self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        (pressed, released)
    }
}
