//! Backend independent controller systems.
//!
//! Movement itself depends on how rays are cast, so it lives in the backend
//! plugins. These systems handle everything around it: rejecting bad
//! configuration, turning platformer input into move intents and keeping
//! the state marker components in sync.

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::controller::Controller2D;
use crate::intent::{MoveIntent, PlatformerInput};
use crate::motion::PlatformerMotion;
use crate::platform::PlatformController;
use crate::state::{Airborne, Grounded, TouchingCeiling, TouchingWall};

/// Log configurations that cannot produce meaningful movement.
pub fn validate_configs(
    q_configs: Query<(Entity, &ControllerConfig), Changed<ControllerConfig>>,
    q_platforms: Query<(Entity, &PlatformController), Changed<PlatformController>>,
) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            warn!("controller config on {entity} rejected: {err}");
        }
    }
    for (entity, platform) in &q_platforms {
        if let Err(err) = platform.validate() {
            warn!("platform on {entity} rejected: {err}");
        }
    }
}

/// Integrate platformer motion and queue the resulting move.
pub fn drive_platformers(
    time: Res<Time>,
    mut q_actors: Query<(
        &mut PlatformerMotion,
        &mut PlatformerInput,
        &Controller2D,
        &mut MoveIntent,
    )>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (mut motion, mut input, controller, mut intent) in &mut q_actors {
        motion.apply_collisions(&controller.collisions);
        let displacement = motion.step(&mut input, &controller.collisions, dt);
        intent.set_move(displacement, input.axis);
    }
}

/// Sync state marker components with the last collision report.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &Controller2D,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
        Has<TouchingCeiling>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, wall, has_ceiling) in &q_controllers {
        let collisions = &controller.collisions;

        if collisions.below && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !collisions.below && (has_grounded || !has_airborne) {
            commands.entity(entity).remove::<Grounded>().insert(Airborne);
        }

        let wall_direction = collisions.wall_direction();
        if collisions.touching_wall() {
            if wall.is_none_or(|wall| wall.direction != wall_direction) {
                commands
                    .entity(entity)
                    .insert(TouchingWall::new(wall_direction));
            }
        } else if wall.is_some() {
            commands.entity(entity).remove::<TouchingWall>();
        }

        if collisions.above && !has_ceiling {
            commands.entity(entity).insert(TouchingCeiling);
        } else if !collisions.above && has_ceiling {
            commands.entity(entity).remove::<TouchingCeiling>();
        }
    }
}
