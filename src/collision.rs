//! Ray hit records and collision filtering.
//!
//! These types are shared by every [`RayCaster`](crate::backend::RayCaster)
//! implementation and by both resolvers.

use bevy::prelude::*;
use bitflags::bitflags;

bitflags! {
    /// Collision layers a ray considers when looking for hits.
    ///
    /// Colliders belong to one or more layers; a ray only reports colliders
    /// whose layers intersect the mask it was cast with. Bits above the
    /// predefined ones are free for game-specific categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionLayers: u32 {
        /// Static level geometry.
        const TERRAIN = 1 << 0;
        /// Platforms that can be jumped through from below.
        const ONE_WAY = 1 << 1;
        /// Actors driven by a [`Controller2D`](crate::controller::Controller2D).
        const ACTORS = 1 << 2;
        /// Moving platforms.
        const PLATFORMS = 1 << 3;
    }
}

impl CollisionLayers {
    /// Everything an actor normally stands on or bumps into.
    pub const ENVIRONMENT: Self = Self::TERRAIN
        .union(Self::ONE_WAY)
        .union(Self::PLATFORMS);
}

/// How a struck surface behaves for vertical resolution.
///
/// Attach this component to a collider to turn it into a one-way platform.
/// Colliders without it are [`SurfaceKind::Solid`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[reflect(Component)]
pub enum SurfaceKind {
    /// Blocks movement from every side.
    #[default]
    Solid,
    /// Only blocks actors landing on it from above; actors can jump up through
    /// it and drop down through it on request.
    OneWay,
}

/// Information about a single raycast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if known).
    pub entity: Option<Entity>,
    /// Behavior of the struck surface.
    pub surface: SurfaceKind,
}

impl RayHit {
    /// Create a hit against a solid surface.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
            surface: SurfaceKind::Solid,
        }
    }

    /// Build a hit from a ray query result.
    ///
    /// Casters report no normal when the ray starts inside a collider; the
    /// hit then faces back along the ray.
    pub fn from_cast(
        origin: Vec2,
        direction: Vec2,
        distance: f32,
        normal: Vec2,
        entity: Option<Entity>,
    ) -> Self {
        let normal = if normal == Vec2::ZERO { -direction } else { normal };
        Self::new(distance, normal, origin + direction * distance, entity)
    }

    /// Set the surface kind of the struck collider.
    pub fn with_surface(mut self, surface: SurfaceKind) -> Self {
        self.surface = surface;
        self
    }

    /// Angle between the surface normal and world up, in degrees.
    ///
    /// 0 is a flat floor, 90 a vertical wall.
    pub fn slope_angle(&self) -> f32 {
        surface_angle(self.normal)
    }

    /// Whether the struck surface is a one-way platform.
    pub fn is_one_way(&self) -> bool {
        self.surface == SurfaceKind::OneWay
    }
}

/// Angle in degrees between `normal` and `Vec2::Y`.
pub fn surface_angle(normal: Vec2) -> f32 {
    let normal = normal.normalize_or_zero();
    normal.dot(Vec2::Y).clamp(-1.0, 1.0).acos().to_degrees()
}
