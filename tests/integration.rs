//! Integration tests for the controller running inside a Bevy app.
//!
//! Rays are cast through Rapier's query pipeline; every test checks the
//! resulting transforms and collision reports.

#![cfg(feature = "rapier2d")]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier2d::prelude::*;
use raycast_controller2d::prelude::*;
use raycast_controller2d::rapier::{collision_groups, Rapier2dActorBundle};

/// Create a minimal test app with physics and the raycast controller.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(RaycastControllerPlugin::<Rapier2dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    // Every update advances exactly one fixed step.
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / 60.0,
    )));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static terrain box.
fn spawn_ground(app: &mut App, position: Vec2, half_size: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(half_size.x, half_size.y),
            collision_groups(CollisionLayers::TERRAIN),
        ))
        .id()
}

/// Spawn a 1x1 actor.
fn spawn_actor(app: &mut App, position: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            Controller2D::new(),
            ControllerConfig::default(),
            Rapier2dActorBundle::new(Vec2::splat(0.5)),
        ))
        .id()
}

/// Run one physics step.
fn tick(app: &mut App) {
    app.update();
}

/// Queue a move and run one physics step.
fn tick_with_move(app: &mut App, entity: Entity, displacement: Vec2) {
    if let Some(mut intent) = app.world_mut().get_mut::<MoveIntent>(entity) {
        intent.set_displacement(displacement);
    }
    tick(app);
}

fn position(app: &App, entity: Entity) -> Vec2 {
    app.world()
        .get::<Transform>(entity)
        .unwrap()
        .translation
        .truncate()
}

// ==================== Landing Tests ====================

mod landing {
    use super::*;

    #[test]
    fn falling_actor_lands_on_ground() {
        let mut app = create_test_app();

        // Ground surface at y = 0
        spawn_ground(&mut app, Vec2::new(0.0, -0.5), Vec2::new(10.0, 0.5));
        let actor = spawn_actor(&mut app, Vec2::new(0.0, 2.0));

        for _ in 0..40 {
            tick_with_move(&mut app, actor, Vec2::new(0.0, -0.1));
        }

        let controller = app.world().get::<Controller2D>(actor).unwrap();
        let y = position(&app, actor).y;

        // PROOF: resting on the surface, not sunk into it
        assert!(controller.collisions.below, "Actor should be on the ground");
        assert!((y - 0.5).abs() < 0.02, "Actor center should rest at 0.5, got {y}");
        assert!(app.world().get::<Grounded>(actor).is_some());
        assert!(app.world().get::<Airborne>(actor).is_none());
    }

    #[test]
    fn actor_without_intent_stays_put() {
        let mut app = create_test_app();

        spawn_ground(&mut app, Vec2::new(0.0, -0.5), Vec2::new(10.0, 0.5));
        let actor = spawn_actor(&mut app, Vec2::new(0.0, 3.0));

        for _ in 0..10 {
            tick(&mut app);
        }

        let moved = position(&app, actor) - Vec2::new(0.0, 3.0);
        assert!(moved.length() < 1e-4, "Actor moved by {moved:?}");
    }
}

// ==================== Wall Tests ====================

mod walls {
    use super::*;

    #[test]
    fn walking_into_wall_stops_at_wall() {
        let mut app = create_test_app();

        spawn_ground(&mut app, Vec2::new(0.0, -0.5), Vec2::new(10.0, 0.5));
        // Wall face at x = 3
        spawn_ground(&mut app, Vec2::new(3.5, 2.0), Vec2::new(0.5, 2.0));
        let actor = spawn_actor(&mut app, Vec2::new(0.0, 0.5));

        for _ in 0..40 {
            tick_with_move(&mut app, actor, Vec2::new(0.2, 0.0));
        }

        let x = position(&app, actor).x;
        let controller = app.world().get::<Controller2D>(actor).unwrap();

        // PROOF: the right edge stops at the wall face
        assert!((x - 2.5).abs() < 0.02, "Actor center should stop at 2.5, got {x}");
        assert!(controller.collisions.right);
        let wall = app.world().get::<TouchingWall>(actor).unwrap();
        assert!(wall.is_right());
    }
}

// ==================== Platform Tests ====================

mod platforms {
    use super::*;

    #[test]
    fn platform_carries_rider() {
        let mut app = create_test_app();

        // Kinematic platform, top edge at y = 0.25
        let transform = Transform::from_xyz(0.0, 0.0, 0.0);
        let platform = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                PlatformController::new(Vec2::new(1.0, 0.0)).with_ray_counts(4, 8),
                RigidBody::KinematicPositionBased,
                Collider::cuboid(2.0, 0.25),
                collision_groups(CollisionLayers::PLATFORMS),
            ))
            .id();
        let rider = spawn_actor(&mut app, Vec2::new(0.0, 0.75));

        for _ in 0..30 {
            tick(&mut app);
        }

        let platform_x = position(&app, platform).x;
        let rider_x = position(&app, rider).x;
        let controller = app.world().get::<Controller2D>(rider).unwrap();

        // PROOF: both moved right by the same amount
        assert!(platform_x > 0.1, "Platform should move, got {platform_x}");
        assert!(
            (rider_x - platform_x).abs() < 0.05,
            "Rider should follow the platform: rider {rider_x}, platform {platform_x}"
        );
        assert!(controller.collisions.below);
    }

    /// Spawn a still 4 x 0.5 platform at the origin and a platformer rider
    /// resting on its top edge at y = 0.25.
    fn spawn_platform_with_rider(app: &mut App) -> (Entity, Entity) {
        let transform = Transform::from_xyz(0.0, 0.0, 0.0);
        let platform = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                PlatformController::new(Vec2::ZERO).with_ray_counts(4, 8),
                RigidBody::KinematicPositionBased,
                Collider::cuboid(2.0, 0.25),
                collision_groups(CollisionLayers::PLATFORMS),
            ))
            .id();
        let transform = Transform::from_xyz(0.0, 0.75, 0.0);
        let rider = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                PlatformerMotion::default(),
                Rapier2dActorBundle::new(Vec2::splat(0.5)),
            ))
            .id();

        for _ in 0..5 {
            tick(app);
        }
        (platform, rider)
    }

    fn ride_vertical_platform(velocity_y: f32) {
        let mut app = create_test_app();
        let (platform, rider) = spawn_platform_with_rider(&mut app);
        app.world_mut()
            .get_mut::<PlatformController>(platform)
            .unwrap()
            .velocity = Vec2::new(0.0, velocity_y);

        for step in 0..30 {
            tick(&mut app);

            let platform_top = position(&app, platform).y + 0.25;
            let rider_bottom = position(&app, rider).y - 0.5;
            let controller = app.world().get::<Controller2D>(rider).unwrap();

            // PROOF: the rider stays on the top edge every step
            assert!(controller.collisions.below, "Rider left the platform at step {step}");
            assert!(
                (rider_bottom - platform_top).abs() < 0.02,
                "Step {step}: rider bottom {rider_bottom}, platform top {platform_top}"
            );
        }

        let travelled = position(&app, platform).y;
        assert!(travelled.abs() > 1.0, "Platform should move, got {travelled}");
    }

    #[test]
    fn rising_platform_lifts_rider_without_sinking() {
        ride_vertical_platform(3.0);
    }

    #[test]
    fn sinking_platform_keeps_rider_on_top() {
        ride_vertical_platform(-3.0);
    }
}

// ==================== Platformer Motion Tests ====================

mod motion {
    use super::*;

    #[test]
    fn platformer_falls_and_lands() {
        let mut app = create_test_app();

        spawn_ground(&mut app, Vec2::new(0.0, -0.5), Vec2::new(10.0, 0.5));
        let transform = Transform::from_xyz(0.0, 1.5, 0.0);
        let actor = app
            .world_mut()
            .spawn((
                transform,
                GlobalTransform::from(transform),
                PlatformerMotion::default(),
                Rapier2dActorBundle::new(Vec2::splat(0.5)),
            ))
            .id();

        for _ in 0..60 {
            tick(&mut app);
        }

        let controller = app.world().get::<Controller2D>(actor).unwrap();
        let y = position(&app, actor).y;

        assert!(controller.collisions.below, "Platformer should land");
        assert!((y - 0.5).abs() < 0.02, "Platformer should rest at 0.5, got {y}");
    }
}
