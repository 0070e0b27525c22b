//! Rapier2D physics backend.
//!
//! Rays go through Rapier's query pipeline. Actors and platforms are
//! kinematic: their `Transform` is moved directly by the resolvers, and the
//! box bounds come from their cuboid `Collider`.
//!
//! Colliders opt into [`CollisionLayers`] through [`collision_groups`]; a
//! collider without `CollisionGroups` is a member of every layer.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::{ControllerBackend, RayCaster};
use crate::collision::{CollisionLayers, RayHit, SurfaceKind};
use crate::config::ControllerConfig;
use crate::controller::Controller2D;
use crate::geometry::BoundingBox;
use crate::intent::MoveIntent;
use crate::platform::{apply_passenger_moves, PassengerMovement, PlatformController};
use crate::RaycastControllerSet;

/// Rapier2D physics backend for the raycast controller.
pub struct Rapier2dBackend;

impl ControllerBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }
}

/// Plugin that sets up Rapier2D-specific movement systems.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            rapier_move_platforms.in_set(RaycastControllerSet::MovePlatforms),
        );
        app.add_systems(
            FixedUpdate,
            rapier_move_actors.in_set(RaycastControllerSet::MoveActors),
        );
    }
}

/// Collision groups placing a collider on `layers`.
pub fn collision_groups(layers: CollisionLayers) -> CollisionGroups {
    CollisionGroups::new(Group::from_bits_truncate(layers.bits()), Group::ALL)
}

/// Axis-aligned bounds of a cuboid collider at `transform`.
///
/// Returns `None` for other shapes. Scale is applied, rotation ignored.
pub fn collider_bounds(transform: &Transform, collider: &Collider) -> Option<BoundingBox> {
    let cuboid = collider.as_cuboid()?;
    Some(BoundingBox::new(
        transform.translation.truncate(),
        cuboid.half_extents() * transform.scale.truncate(),
    ))
}

/// [`RayCaster`] backed by a Rapier context, skipping the casting collider.
pub struct RapierRayCaster<'a, 'w, 's> {
    query_pipeline: &'a RapierQueryPipeline,
    colliders: &'a RapierContextColliders,
    rigidbody_set: &'a RapierRigidBodySet,
    exclude: Entity,
    surfaces: &'a Query<'w, 's, &'static SurfaceKind>,
}

impl<'a, 'w, 's> RapierRayCaster<'a, 'w, 's> {
    pub fn new(
        context: &'a RapierContextMut<'_>,
        exclude: Entity,
        surfaces: &'a Query<'w, 's, &'static SurfaceKind>,
    ) -> Self {
        Self {
            query_pipeline: &context.query_pipeline,
            colliders: &context.colliders,
            rigidbody_set: &context.rigidbody_set,
            exclude,
            surfaces,
        }
    }
}

impl RayCaster for RapierRayCaster<'_, '_, '_> {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layers: CollisionLayers,
    ) -> Option<RayHit> {
        let filter = QueryFilter::default()
            .exclude_collider(self.exclude)
            .exclude_sensors()
            .groups(CollisionGroups::new(
                Group::ALL,
                Group::from_bits_truncate(layers.bits()),
            ));

        self.query_pipeline
            .cast_ray_and_get_normal(
                self.colliders,
                self.rigidbody_set,
                origin,
                direction,
                max_distance,
                true,
                filter,
            )
            .map(|(entity, hit)| {
                let surface = self.surfaces.get(entity).copied().unwrap_or_default();
                RayHit::from_cast(origin, direction, hit.time_of_impact, hit.normal, Some(entity))
                    .with_surface(surface)
            })
    }
}

/// Write `translation` into the collider of `entity` and refresh the query
/// pipeline, so later rays in the same step see the new pose.
pub fn sync_collider(context: &mut RapierContextMut, entity: Entity, translation: Vec2) {
    let Some(&handle) = context.colliders.entity2collider().get(&entity) else {
        return;
    };
    let Some(collider) = context.colliders.colliders.get_mut(handle) else {
        return;
    };
    collider.set_translation(translation.into());
    context
        .query_pipeline
        .update_query_pipeline(&context.colliders);
}

type PassengerItems = (
    &'static mut Controller2D,
    &'static ControllerConfig,
    &'static mut Transform,
    &'static Collider,
);

fn carry_passenger(
    context: &mut RapierContextMut,
    q_actors: &mut Query<PassengerItems, Without<PlatformController>>,
    q_surfaces: &Query<&'static SurfaceKind>,
    platform: Entity,
    passenger: &PassengerMovement,
    now: f32,
) {
    let Ok((mut controller, config, mut transform, collider)) = q_actors.get_mut(passenger.entity)
    else {
        warn!(
            "platform {platform} hit {} which has no controller",
            passenger.entity
        );
        return;
    };
    let Some(bounds) = collider_bounds(&transform, collider) else {
        return;
    };
    let moved = {
        let caster = RapierRayCaster::new(context, passenger.entity, q_surfaces);
        controller.move_and_collide(
            config,
            &caster,
            &bounds,
            passenger.velocity,
            Vec2::ZERO,
            passenger.standing_on_platform,
            now,
        )
    };
    transform.translation += moved.extend(0.0);
    sync_collider(context, passenger.entity, transform.translation.truncate());
}

/// Move platforms and the passengers they carry or push.
pub fn rapier_move_platforms(
    mut rapier_context: WriteRapierContext,
    time: Res<Time>,
    mut q_platforms: Query<
        (Entity, &PlatformController, &mut Transform, &Collider),
        Without<Controller2D>,
    >,
    mut q_actors: Query<PassengerItems, Without<PlatformController>>,
    q_surfaces: Query<&'static SurfaceKind>,
) {
    let Ok(mut context) = rapier_context.single_mut() else {
        return;
    };
    let dt = time.delta_secs();
    let now = time.elapsed_secs();

    for (entity, platform, mut transform, collider) in &mut q_platforms {
        let Some(bounds) = collider_bounds(&transform, collider) else {
            continue;
        };
        let velocity = platform.displacement(dt);
        let moves = {
            let caster = RapierRayCaster::new(&context, entity, &q_surfaces);
            platform.compute_passenger_moves(&caster, &bounds, velocity)
        };

        apply_passenger_moves(&moves, true, |passenger| {
            carry_passenger(&mut context, &mut q_actors, &q_surfaces, entity, passenger, now);
        });
        transform.translation += velocity.extend(0.0);
        sync_collider(&mut context, entity, transform.translation.truncate());
        apply_passenger_moves(&moves, false, |passenger| {
            carry_passenger(&mut context, &mut q_actors, &q_surfaces, entity, passenger, now);
        });
    }
}

/// Resolve pending [`MoveIntent`]s and move actors.
pub fn rapier_move_actors(
    mut rapier_context: WriteRapierContext,
    time: Res<Time>,
    mut q_actors: Query<
        (
            Entity,
            &mut Controller2D,
            &ControllerConfig,
            &mut MoveIntent,
            &mut Transform,
            &Collider,
        ),
        Without<PlatformController>,
    >,
    q_surfaces: Query<&'static SurfaceKind>,
) {
    let Ok(mut context) = rapier_context.single_mut() else {
        return;
    };
    let now = time.elapsed_secs();

    for (entity, mut controller, config, mut intent, mut transform, collider) in &mut q_actors {
        let Some((displacement, input)) = intent.take() else {
            continue;
        };
        let Some(bounds) = collider_bounds(&transform, collider) else {
            continue;
        };
        let moved = {
            let caster = RapierRayCaster::new(&context, entity, &q_surfaces);
            controller.move_and_collide(
                config,
                &caster,
                &bounds,
                displacement,
                input,
                false,
                now,
            )
        };
        transform.translation += moved.extend(0.0);
        sync_collider(&mut context, entity, transform.translation.truncate());
    }
}

/// Components for a kinematic actor driven by the raycast controller.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use raycast_controller2d::prelude::*;
/// use raycast_controller2d::rapier::Rapier2dActorBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         Controller2D::new(),
///         ControllerConfig::player(),
///         PlatformerMotion::default(),
///         Rapier2dActorBundle::new(Vec2::new(0.5, 0.9)),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dActorBundle {
    pub rigid_body: RigidBody,
    pub collider: Collider,
    pub collision_groups: CollisionGroups,
}

impl Rapier2dActorBundle {
    /// Kinematic box actor with the given half-extents on the actor layer.
    pub fn new(half_extents: Vec2) -> Self {
        Self {
            rigid_body: RigidBody::KinematicPositionBased,
            collider: Collider::cuboid(half_extents.x, half_extents.y),
            collision_groups: collision_groups(CollisionLayers::ACTORS),
        }
    }

    /// Set which layers the actor is a member of.
    pub fn with_layers(mut self, layers: CollisionLayers) -> Self {
        self.collision_groups = collision_groups(layers);
        self
    }
}
