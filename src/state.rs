//! Query-friendly markers derived from [`PlatformerController`].
//!
//! `sync_state_markers` inserts and removes them in
//! [`PlatformerSet::FinalApplication`](crate::PlatformerSet), after the
//! controller has ticked, so animation and audio systems can use plain
//! `With<..>` filters instead of reading the controller.
//!
//! [`PlatformerController`]: crate::controller::PlatformerController

use bevy::prelude::*;

/// The controller is standing on ground. Never present together with
/// [`Airborne`].
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn dust_on_run(q_runners: Query<&PlatformerController, With<Grounded>>) {
///     for controller in &q_runners {
///         let _running = controller.speed().x.abs() > 1.0;
///     }
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// The controller is off the ground, including while climbing.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Climbing. Present alongside [`Grounded`] when standing at a ladder's foot.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct OnLadder;
