//! Physics backend abstraction.
//!
//! The resolvers only need one thing from the outside world: a synchronous
//! ray query against the current scene. [`RayCaster`] is that query.
//! [`ControllerBackend`] wires a concrete physics engine into the Bevy
//! schedule, so engines can be swapped (Rapier2D, a headless scene, custom).

use bevy::prelude::*;

use crate::collision::{CollisionLayers, RayHit};

/// Ray-cast primitive consumed by the collision resolvers.
///
/// Implementations return the nearest hit along the ray, or `None`. A ray
/// whose origin is already inside a collider reports a hit at distance 0.
/// The caster is responsible for excluding the body that is casting.
pub trait RayCaster {
    /// Cast a ray from `origin` along `direction` (unit length) up to
    /// `max_distance`, considering colliders whose layers intersect `layers`.
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit>;
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit> {
        (**self).cast_ray(origin, direction, max_distance, layers)
    }
}

/// Trait for physics backend implementations.
///
/// A backend provides the systems that read box bounds from its colliders,
/// cast rays through its query pipeline and move platforms and actors in the
/// [`RaycastControllerSet`](crate::RaycastControllerSet) phases.
///
/// For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`.
pub trait ControllerBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// Backend without any movement systems.
///
/// Useful when the resolvers are driven by hand (for example from a
/// server loop against a [`StaticScene`](crate::scene::StaticScene)) while the
/// plugin still registers components and keeps state markers in sync.
pub struct ManualBackend;

impl ControllerBackend for ManualBackend {
    fn plugin() -> impl Plugin {
        NoOpBackendPlugin
    }
}
