//! Headless collision scene.
//!
//! [`StaticScene`] is a small in-memory world of parry shapes that answers
//! ray queries without a physics pipeline. It is enough to run the resolvers
//! deterministically on a server, in tools, or in tests: boxes, ramps and
//! one-way platforms, each of which can be translated between steps.

use bevy::prelude::*;
use parry2d::math::{Isometry, Point, Real, Vector};
use parry2d::query::{Ray, RayCast};
use parry2d::shape::{Shape, SharedShape};

use crate::backend::RayCaster;
use crate::collision::{CollisionLayers, RayHit, SurfaceKind};
use crate::config::ControllerConfig;
use crate::controller::Controller2D;
use crate::geometry::BoundingBox;
use crate::platform::{apply_passenger_moves, PassengerMovement, PlatformController};

/// A collider in a [`StaticScene`].
#[derive(Debug, Clone)]
pub struct SceneBody {
    pub entity: Entity,
    /// World offset of the shape.
    pub position: Vec2,
    pub layers: CollisionLayers,
    pub surface: SurfaceKind,
    shape: SharedShape,
}

impl SceneBody {
    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    fn isometry(&self) -> Isometry<Real> {
        Isometry::new(vector(self.position), 0.0)
    }

    /// World-space axis-aligned bounds.
    pub fn bounds(&self) -> BoundingBox {
        let aabb = self.shape.compute_aabb(&self.isometry());
        let (min, max) = (vec2(aabb.mins.coords), vec2(aabb.maxs.coords));
        BoundingBox::new((min + max) * 0.5, (max - min) * 0.5)
    }

    fn cast_ray(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        let ray = Ray::new(point(origin), vector(direction));
        self.shape
            .cast_ray_and_get_normal(&self.isometry(), &ray, max_distance, true)
            .map(|hit| (hit.time_of_impact, vec2(hit.normal)))
    }
}

fn point(v: Vec2) -> Point<Real> {
    Point::new(v.x, v.y)
}

fn vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

fn vec2(v: Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// In-memory collision world.
#[derive(Resource, Debug, Clone, Default)]
pub struct StaticScene {
    bodies: Vec<SceneBody>,
    next_id: u32,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, position: Vec2, shape: SharedShape, layers: CollisionLayers) -> Entity {
        self.next_id += 1;
        let entity = Entity::from_raw(self.next_id);
        self.bodies.push(SceneBody {
            entity,
            position,
            layers,
            surface: SurfaceKind::Solid,
            shape,
        });
        entity
    }

    /// Add the convex hull of `vertices` at `position`, in any winding.
    ///
    /// Returns `None` for fewer than three points or when no polygon can be
    /// built from them.
    pub fn add_polygon(
        &mut self,
        position: Vec2,
        vertices: impl IntoIterator<Item = Vec2>,
        layers: CollisionLayers,
    ) -> Option<Entity> {
        let points: Vec<Point<Real>> = vertices.into_iter().map(point).collect();
        if points.len() < 3 {
            return None;
        }
        let shape = SharedShape::convex_hull(&points)?;
        Some(self.insert(position, shape, layers))
    }

    /// Add an axis-aligned box.
    pub fn add_box(&mut self, bounds: BoundingBox, layers: CollisionLayers) -> Entity {
        let h = bounds.half_extents;
        self.insert(bounds.center, SharedShape::cuboid(h.x, h.y), layers)
    }

    /// Add a one-way platform on the [`CollisionLayers::ONE_WAY`] layer.
    pub fn add_one_way(&mut self, bounds: BoundingBox) -> Entity {
        let entity = self.add_box(bounds, CollisionLayers::ONE_WAY);
        self.set_surface(entity, SurfaceKind::OneWay);
        entity
    }

    /// Add a right-triangle ramp on the terrain layer.
    ///
    /// The ramp starts at `foot` and rises by `angle_degrees` over the
    /// horizontal distance `run`: a positive `run` rises to the right, a
    /// negative one to the left.
    pub fn add_ramp(&mut self, foot: Vec2, run: f32, angle_degrees: f32) -> Option<Entity> {
        let rise = run.abs() * angle_degrees.to_radians().tan();
        self.add_polygon(
            Vec2::ZERO,
            [foot, foot + Vec2::new(run, 0.0), foot + Vec2::new(run, rise)],
            CollisionLayers::TERRAIN,
        )
    }

    pub fn set_surface(&mut self, entity: Entity, surface: SurfaceKind) {
        if let Some(body) = self.body_mut(entity) {
            body.surface = surface;
        }
    }

    pub fn set_layers(&mut self, entity: Entity, layers: CollisionLayers) {
        if let Some(body) = self.body_mut(entity) {
            body.layers = layers;
        }
    }

    pub fn body(&self, entity: Entity) -> Option<&SceneBody> {
        self.bodies.iter().find(|body| body.entity == entity)
    }

    fn body_mut(&mut self, entity: Entity) -> Option<&mut SceneBody> {
        self.bodies.iter_mut().find(|body| body.entity == entity)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &SceneBody> {
        self.bodies.iter()
    }

    /// Move a body by `delta`. Returns `false` for unknown entities.
    pub fn translate(&mut self, entity: Entity, delta: Vec2) -> bool {
        match self.body_mut(entity) {
            Some(body) => {
                body.position += delta;
                true
            }
            None => false,
        }
    }

    pub fn bounds(&self, entity: Entity) -> Option<BoundingBox> {
        self.body(entity).map(SceneBody::bounds)
    }

    /// Ray caster that ignores `exclude`, typically the body casting.
    pub fn caster(&self, exclude: Entity) -> SceneCaster<'_> {
        SceneCaster {
            scene: self,
            exclude: Some(exclude),
        }
    }

    /// Resolve one move of the body `entity` with `controller` and apply it.
    ///
    /// Returns the corrected displacement, or `None` for unknown entities.
    #[allow(clippy::too_many_arguments)]
    pub fn move_actor(
        &mut self,
        entity: Entity,
        controller: &mut Controller2D,
        config: &ControllerConfig,
        velocity: Vec2,
        input: Vec2,
        standing_on_platform: bool,
        now: f32,
    ) -> Option<Vec2> {
        let bounds = self.bounds(entity)?;
        let moved = controller.move_and_collide(
            config,
            &self.caster(entity),
            &bounds,
            velocity,
            input,
            standing_on_platform,
            now,
        );
        self.translate(entity, moved);
        Some(moved)
    }

    /// Run one platform step: passengers ahead of the platform, the platform
    /// itself, then the passengers it carries.
    ///
    /// `move_passenger` applies a record, usually through
    /// [`move_actor`](Self::move_actor) with the passenger's controller.
    /// Returns the records of this step, or `None` for unknown entities.
    pub fn move_platform(
        &mut self,
        entity: Entity,
        platform: &PlatformController,
        velocity: Vec2,
        mut move_passenger: impl FnMut(&mut StaticScene, &PassengerMovement),
    ) -> Option<Vec<PassengerMovement>> {
        let bounds = self.bounds(entity)?;
        let moves = platform.compute_passenger_moves(&self.caster(entity), &bounds, velocity);

        apply_passenger_moves(&moves, true, |passenger| move_passenger(&mut *self, passenger));
        self.translate(entity, velocity);
        apply_passenger_moves(&moves, false, |passenger| move_passenger(&mut *self, passenger));

        Some(moves)
    }

    fn nearest_hit(
        &self,
        exclude: Option<Entity>,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for body in &self.bodies {
            if Some(body.entity) == exclude || !body.layers.intersects(layers) {
                continue;
            }
            let Some((distance, normal)) = body.cast_ray(origin, direction, max_distance) else {
                continue;
            };
            if nearest.is_none_or(|hit| distance < hit.distance) {
                nearest = Some(
                    RayHit::from_cast(origin, direction, distance, normal, Some(body.entity))
                        .with_surface(body.surface),
                );
            }
        }
        nearest
    }
}

impl RayCaster for StaticScene {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit> {
        self.nearest_hit(None, origin, direction, max_distance, layers)
    }
}

/// A [`StaticScene`] view that skips one body.
#[derive(Debug, Clone, Copy)]
pub struct SceneCaster<'a> {
    scene: &'a StaticScene,
    exclude: Option<Entity>,
}

impl RayCaster for SceneCaster<'_> {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit> {
        self.scene
            .nearest_hit(self.exclude, origin, direction, max_distance, layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(center: Vec2) -> BoundingBox {
        BoundingBox::from_size(center, Vec2::ONE)
    }

    #[test]
    fn ray_hits_nearest_face_with_outward_normal() {
        let mut scene = StaticScene::new();
        let wall = scene.add_box(unit_box(Vec2::new(3.0, 0.0)), CollisionLayers::TERRAIN);

        let hit = scene
            .cast_ray(Vec2::ZERO, Vec2::X, 10.0, CollisionLayers::TERRAIN)
            .unwrap();

        assert!((hit.distance - 2.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::NEG_X);
        assert_eq!(hit.entity, Some(wall));
        assert!((hit.point - Vec2::new(2.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn ray_respects_max_distance_and_layers() {
        let mut scene = StaticScene::new();
        scene.add_box(unit_box(Vec2::new(3.0, 0.0)), CollisionLayers::TERRAIN);

        assert!(scene
            .cast_ray(Vec2::ZERO, Vec2::X, 2.0, CollisionLayers::TERRAIN)
            .is_none());
        assert!(scene
            .cast_ray(Vec2::ZERO, Vec2::X, 10.0, CollisionLayers::ACTORS)
            .is_none());
    }

    #[test]
    fn ray_misses_when_pointing_away_or_parallel_outside() {
        let mut scene = StaticScene::new();
        scene.add_box(unit_box(Vec2::new(3.0, 0.0)), CollisionLayers::TERRAIN);

        assert!(scene
            .cast_ray(Vec2::ZERO, Vec2::NEG_X, 10.0, CollisionLayers::all())
            .is_none());
        assert!(scene
            .cast_ray(Vec2::new(0.0, 2.0), Vec2::X, 10.0, CollisionLayers::all())
            .is_none());
    }

    #[test]
    fn origin_inside_hits_at_zero() {
        let mut scene = StaticScene::new();
        scene.add_box(unit_box(Vec2::ZERO), CollisionLayers::TERRAIN);

        let hit = scene
            .cast_ray(Vec2::new(0.1, 0.1), Vec2::Y, 1.0, CollisionLayers::TERRAIN)
            .unwrap();
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.normal, Vec2::NEG_Y);
    }

    #[test]
    fn ramp_normal_matches_angle() {
        let mut scene = StaticScene::new();
        scene.add_ramp(Vec2::new(1.0, 0.0), 4.0, 30.0);

        let hit = scene
            .cast_ray(Vec2::new(0.0, 0.5), Vec2::X, 10.0, CollisionLayers::TERRAIN)
            .unwrap();

        assert!((hit.slope_angle() - 30.0).abs() < 1e-3);
        assert!(hit.normal.x < 0.0);
        let expected = 1.0 + 0.5 / 30.0_f32.to_radians().tan();
        assert!((hit.distance - expected).abs() < 1e-4);
    }

    #[test]
    fn left_rising_ramp_faces_right() {
        let mut scene = StaticScene::new();
        scene.add_ramp(Vec2::ZERO, -4.0, 45.0);

        let hit = scene
            .cast_ray(Vec2::new(-1.0, 5.0), Vec2::NEG_Y, 10.0, CollisionLayers::TERRAIN)
            .unwrap();
        assert!(hit.normal.x > 0.0);
        assert!((hit.distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn clockwise_polygon_is_accepted() {
        let mut scene = StaticScene::new();
        let clockwise = [
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(-1.0, -1.0),
        ];
        let body = scene
            .add_polygon(Vec2::new(5.0, 0.0), clockwise, CollisionLayers::TERRAIN)
            .unwrap();

        let hit = scene
            .cast_ray(Vec2::ZERO, Vec2::X, 10.0, CollisionLayers::TERRAIN)
            .unwrap();
        assert_eq!(hit.entity, Some(body));
        assert!((hit.distance - 4.0).abs() < 1e-4);
        assert!((hit.normal - Vec2::NEG_X).length() < 1e-4);

        let bounds = scene.bounds(body).unwrap();
        assert!((bounds.center - Vec2::new(5.0, 0.0)).length() < 1e-5);
        assert!(scene
            .add_polygon(Vec2::ZERO, [Vec2::ZERO, Vec2::X], CollisionLayers::TERRAIN)
            .is_none());
    }

    #[test]
    fn caster_excludes_body_and_translate_moves_it() {
        let mut scene = StaticScene::new();
        let a = scene.add_box(unit_box(Vec2::new(2.0, 0.0)), CollisionLayers::ACTORS);
        let b = scene.add_box(unit_box(Vec2::new(5.0, 0.0)), CollisionLayers::ACTORS);

        let hit = scene
            .caster(a)
            .cast_ray(Vec2::ZERO, Vec2::X, 10.0, CollisionLayers::ACTORS)
            .unwrap();
        assert_eq!(hit.entity, Some(b));

        assert!(scene.translate(b, Vec2::new(-1.0, 0.0)));
        assert_eq!(scene.bounds(b).unwrap().center, Vec2::new(4.0, 0.0));
        assert!(!scene.translate(Entity::from_raw(999), Vec2::ONE));
    }

    #[test]
    fn one_way_platform_is_tagged() {
        let mut scene = StaticScene::new();
        let platform = scene.add_one_way(BoundingBox::from_size(Vec2::ZERO, Vec2::new(4.0, 0.5)));

        let body = scene.body(platform).unwrap();
        assert_eq!(body.surface, SurfaceKind::OneWay);
        assert_eq!(body.layers, CollisionLayers::ONE_WAY);
    }
}
