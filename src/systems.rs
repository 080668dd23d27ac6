//! Core controller systems.
//!
//! These systems drive [`PlatformerController`] inside a bevy `App`. The
//! simulation system is generic over the physics backend so different physics
//! engines can be used.

use bevy::prelude::*;

use crate::backend::{BackendBody, PlatformerPhysicsBackend};
use crate::config::ControllerStats;
use crate::controller::{ForceKind, PlatformerController};
use crate::detection::CollisionReport;
use crate::error::ConfigError;
use crate::events::{ControllerMessage, ControllerObservers};
use crate::intent::{ControlIntent, FrameInput};
use crate::state::{Airborne, Grounded, OnLadder};

/// Marks a controller that cannot be simulated.
///
/// Inserted by [`validate_controllers`]. Entities carrying it are skipped by
/// [`advance_controllers`] until it is removed.
#[derive(Component, Debug)]
pub struct Misconfigured(pub ConfigError);

/// Check controllers whose [`ControllerStats`] are new or were replaced.
///
/// On success the controller's air jumps are filled from the stats and any
/// [`Misconfigured`] marker is removed. On failure the error is logged and the
/// entity is tagged [`Misconfigured`].
pub fn validate_controllers(
    mut commands: Commands,
    mut q_controllers: Query<
        (
            Entity,
            &mut PlatformerController,
            Option<&ControllerStats>,
            Has<Misconfigured>,
        ),
        Or<(Added<PlatformerController>, Changed<ControllerStats>)>,
    >,
) {
    for (entity, mut controller, stats, misconfigured) in &mut q_controllers {
        let result = match stats {
            Some(stats) => stats.validate().map(|()| stats),
            None => Err(ConfigError::MissingStats),
        };

        match result {
            Ok(stats) => {
                // Swapping stats on a running controller keeps its jump state
                if controller.is_added() || misconfigured {
                    controller.refill_air_jumps(stats);
                }
                if misconfigured {
                    debug!("Platformer controller on {entity} has valid stats again");
                    commands.entity(entity).remove::<Misconfigured>();
                }
            }
            Err(err) => {
                error!("Platformer controller on {entity} is misconfigured: {err}");
                commands.entity(entity).insert(Misconfigured(err));
            }
        }
    }
}

/// Turn held button levels from [`ControlIntent`] into this tick's
/// [`FrameInput`], with edges computed against the previous tick.
///
/// Jump presses latched by [`ControlIntent::set_jump`] since the last tick
/// count as an edge even if the button is already released.
pub fn latch_frame_input(mut q: Query<(&mut ControlIntent, &mut FrameInput)>) {
    for (mut intent, mut input) in &mut q {
        *input = if intent.jump_latched() {
            intent.latch(&input)
        } else {
            input.advance(intent.movement, intent.jump, intent.interact)
        };
    }
}

/// Run one tick of every valid controller.
///
/// Controllers are cloned out of the world, ticked against a
/// [`BackendBody`] and written back. Events are delivered to the entity's
/// [`ControllerObservers`] first, then sent as [`ControllerMessage`]s.
pub fn advance_controllers<B: PlatformerPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<_> = world
        .query_filtered::<(
            Entity,
            &PlatformerController,
            &ControllerStats,
            &FrameInput,
            &CollisionReport,
        ), Without<Misconfigured>>()
        .iter(world)
        .map(|(e, controller, stats, input, contacts)| {
            (e, controller.clone(), stats.shared(), *input, *contacts)
        })
        .collect();

    for (entity, mut controller, stats, input, contacts) in entities {
        // Listeners are moved out so the body can borrow the world
        let mut observers = world
            .get_mut::<ControllerObservers>(entity)
            .map(|mut observers| std::mem::take(&mut *observers));

        {
            let mut body = BackendBody::<B>::new(world, entity);
            match observers.as_mut() {
                Some(observers) => {
                    controller.tick_observed(&stats, &input, &contacts, &mut body, dt, observers);
                }
                None => {
                    controller.tick(&stats, &input, &contacts, &mut body, dt);
                }
            }
        }

        if let Some(observers) = observers {
            if let Some(mut slot) = world.get_mut::<ControllerObservers>(entity) {
                *slot = observers;
            }
        }

        for event in controller.events() {
            world.send_event(ControllerMessage {
                entity,
                event: *event,
            });
        }

        if let Some(mut slot) = world.get_mut::<PlatformerController>(entity) {
            *slot = controller;
        }
    }
}

/// Sync state marker components with each controller's state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &PlatformerController,
        Has<Grounded>,
        Has<Airborne>,
        Has<OnLadder>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_ladder) in &q_controllers {
        // Sync Grounded/Airborne
        if controller.is_grounded() && !has_grounded {
            commands.entity(entity).insert(Grounded);
            commands.entity(entity).remove::<Airborne>();
        } else if !controller.is_grounded() && has_grounded {
            commands.entity(entity).remove::<Grounded>();
            commands.entity(entity).insert(Airborne);
        } else if !controller.is_grounded() && !has_airborne && !has_grounded {
            commands.entity(entity).insert(Airborne);
        }

        // Sync OnLadder
        if controller.on_ladder() && !has_ladder {
            commands.entity(entity).insert(OnLadder);
        } else if !controller.on_ladder() && has_ladder {
            commands.entity(entity).remove::<OnLadder>();
        }
    }
}

/// Push a character from outside the simulation.
pub fn apply_external_velocity(world: &mut World, entity: Entity, velocity: Vec2, kind: ForceKind) {
    match world.get_mut::<PlatformerController>(entity) {
        Some(mut controller) => controller.apply_external_velocity(velocity, kind),
        None => warn!("apply_external_velocity: {entity} has no PlatformerController"),
    }
}

/// Take control away from a character, optionally zeroing its body velocity
/// through backend `B`.
pub fn revoke_control<B: PlatformerPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    reset_velocity: bool,
) {
    let Some(mut controller) = world.get::<PlatformerController>(entity).cloned() else {
        warn!("revoke_control: {entity} has no PlatformerController");
        return;
    };

    controller.revoke_control(reset_velocity, &mut BackendBody::<B>::new(world, entity));

    if let Some(mut slot) = world.get_mut::<PlatformerController>(entity) {
        *slot = controller;
    }
}

/// Give control back to a character.
pub fn restore_control(world: &mut World, entity: Entity) {
    match world.get_mut::<PlatformerController>(entity) {
        Some(mut controller) => controller.restore_control(),
        None => warn!("restore_control: {entity} has no PlatformerController"),
    }
}
