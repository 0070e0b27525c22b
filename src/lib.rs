//! # `raycast_controller2d`
//!
//! A deterministic raycast-based 2D kinematic controller for axis-aligned
//! box actors, with a physics backend abstraction.
//!
//! This crate provides:
//! - A collision resolver that corrects an actor's displacement against the
//!   scene with parallel edge rays
//! - Slope climbing and descending up to configurable angles
//! - One-way platforms that can be jumped through and dropped through
//! - Moving platforms that carry and push passenger actors
//! - A platformer motion driver with jump-height based gravity
//! - Backends for Rapier2D and for a headless in-memory scene
//!
//! ## Architecture
//!
//! The controller is **kinematic**: nothing is simulated by a physics engine.
//! Each fixed step:
//! 1. Gameplay code (or [`PlatformerMotion`](motion::PlatformerMotion))
//!    writes a [`MoveIntent`](intent::MoveIntent)
//! 2. Platforms move and hand their passengers a forced displacement
//! 3. Each actor's [`Controller2D`](controller::Controller2D) casts rays
//!    through the backend's [`RayCaster`](backend::RayCaster) and clamps the
//!    displacement to the first surfaces in the way
//! 4. The corrected displacement is applied to the actor's position
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use raycast_controller2d::prelude::*;
//!
//! // A floor and an actor falling onto it, without any ECS.
//! let mut scene = StaticScene::new();
//! scene.add_box(
//!     BoundingBox::from_size(Vec2::new(0.0, -1.0), Vec2::new(20.0, 1.0)),
//!     CollisionLayers::TERRAIN,
//! );
//! let actor = scene.add_box(
//!     BoundingBox::from_size(Vec2::new(0.0, 1.0), Vec2::ONE),
//!     CollisionLayers::ACTORS,
//! );
//!
//! let config = ControllerConfig::default();
//! let mut controller = Controller2D::new();
//! for step in 0..10 {
//!     let now = step as f32 / 60.0;
//!     scene.move_actor(
//!         actor,
//!         &mut controller,
//!         &config,
//!         Vec2::new(0.0, -0.5),
//!         Vec2::ZERO,
//!         false,
//!         now,
//!     );
//! }
//!
//! assert!(controller.collisions.below);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod geometry;
pub mod intent;
pub mod motion;
pub mod platform;
pub mod scene;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{ControllerBackend, ManualBackend, RayCaster};
    pub use crate::collision::{CollisionLayers, RayHit, SurfaceKind};
    pub use crate::config::{ConfigError, ControllerConfig};
    pub use crate::controller::Controller2D;
    pub use crate::geometry::{BoundingBox, RayCounts, RayOrigins, RaySpacing, SKIN_WIDTH};
    pub use crate::intent::{MoveIntent, PlatformerInput};
    pub use crate::motion::PlatformerMotion;
    pub use crate::platform::{apply_passenger_moves, PassengerMovement, PlatformController};
    pub use crate::scene::StaticScene;
    pub use crate::state::{Airborne, CollisionInfo, Grounded, TouchingCeiling, TouchingWall};
    pub use crate::{RaycastControllerPlugin, RaycastControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::Rapier2dBackend;
}

/// System sets for the controller's fixed step, run in this order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaycastControllerSet {
    /// Report invalid configuration.
    Validation,
    /// Turn input into move intents.
    Drive,
    /// Move platforms and their passengers.
    MovePlatforms,
    /// Resolve and apply actor move intents.
    MoveActors,
    /// Update state marker components.
    Sync,
}

/// Main plugin for the raycast controller.
///
/// This plugin is generic over a physics backend `B` which provides the
/// movement systems that cast rays against the backend's colliders.
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use raycast_controller2d::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(RaycastControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct RaycastControllerPlugin<B: backend::ControllerBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::ControllerBackend> Default for RaycastControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::ControllerBackend> Plugin for RaycastControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<controller::Controller2D>();
        app.register_type::<collision::SurfaceKind>();
        app.register_type::<intent::MoveIntent>();
        app.register_type::<intent::PlatformerInput>();
        app.register_type::<motion::PlatformerMotion>();
        app.register_type::<platform::PlatformController>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::TouchingCeiling>();

        app.configure_sets(
            FixedUpdate,
            (
                RaycastControllerSet::Validation,
                RaycastControllerSet::Drive,
                RaycastControllerSet::MovePlatforms,
                RaycastControllerSet::MoveActors,
                RaycastControllerSet::Sync,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::validate_configs.in_set(RaycastControllerSet::Validation),
                systems::drive_platformers.in_set(RaycastControllerSet::Drive),
                systems::sync_state_markers.in_set(RaycastControllerSet::Sync),
            ),
        );
    }
}
