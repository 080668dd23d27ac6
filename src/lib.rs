//! # `platformer_controller`
//!
//! A fixed-timestep 2D platformer character controller with physics backend
//! abstraction.
//!
//! This crate provides a responsive, tuneable platformer controller that:
//! - Accelerates and decelerates horizontally, with separate ground/air rates
//! - Supports coyote time, jump buffering, variable jump height and air jumps
//! - Follows slopes while grounded
//! - Climbs ladders (optional, enabled per [`StatsConfig`](config::StatsConfig))
//! - Accepts external knockback, either as a burst or a decaying force
//! - Abstracts the physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! Every fixed tick runs in four phases ([`PlatformerSet`]):
//! 1. **Preparation** - validate new controllers, latch input edges
//! 2. **Sensors** - the backend probes the world into a `CollisionReport`
//! 3. **Simulation** - the state machine advances one tick and writes a
//!    velocity to the body
//! 4. **FinalApplication** - state markers are synced, backends integrate
//!
//! The state machine itself ([`PlatformerController`](controller::PlatformerController))
//! has no bevy dependencies beyond math types and can be ticked by hand.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_controller::prelude::*;
//!
//! // Create controller components for a character that can climb
//! let stats = ControllerStats::new(StatsConfig::climber());
//! let controller = PlatformerController::new(&stats);
//! let intent = ControlIntent::default();
//!
//! // These can be spawned together with a physics bundle
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod detection;
pub mod error;
pub mod events;
pub mod intent;
pub mod math;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{
        BackendBody, CharacterBody, KinematicBackend, KinematicBody, KinematicVelocity,
        PlatformerPhysicsBackend,
    };
    pub use crate::collision::{CollisionData, ShapeHits};
    pub use crate::config::{ControllerStats, StatsConfig};
    pub use crate::controller::{Facing, ForceKind, PlatformerController};
    pub use crate::detection::{CollisionProbe, CollisionReport, ProbeFilter};
    pub use crate::error::ConfigError;
    pub use crate::events::{ControllerEvent, ControllerMessage, ControllerObservers, ListenerId};
    pub use crate::intent::{ControlIntent, FrameInput};
    pub use crate::state::{Airborne, Grounded, OnLadder};
    pub use crate::systems::Misconfigured;
    pub use crate::{PlatformerControllerPlugin, PlatformerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dPlatformerBundle};
}

/// Phases of one fixed tick, run in this order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformerSet {
    /// Validation and input latching.
    Preparation,
    /// Backend collision probing.
    Sensors,
    /// The state machine tick.
    Simulation,
    /// Marker sync and backend integration.
    FinalApplication,
}

/// Main plugin for the platformer controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity access, collision probing, etc.).
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
/// use platformer_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(PlatformerControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlatformerControllerPlugin<B: backend::PlatformerPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::PlatformerPhysicsBackend> Default for PlatformerControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::PlatformerPhysicsBackend> Plugin for PlatformerControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::PlatformerController>();
        app.register_type::<controller::Facing>();
        app.register_type::<controller::ForceKind>();
        app.register_type::<config::StatsConfig>();
        app.register_type::<intent::FrameInput>();
        app.register_type::<intent::ControlIntent>();
        app.register_type::<events::ControllerEvent>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::OnLadder>();

        app.add_event::<events::ControllerMessage>();

        app.configure_sets(
            FixedUpdate,
            (
                PlatformerSet::Preparation,
                PlatformerSet::Sensors,
                PlatformerSet::Simulation,
                PlatformerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::validate_controllers, systems::latch_frame_input)
                .in_set(PlatformerSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::advance_controllers::<B>.in_set(PlatformerSet::Simulation),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(PlatformerSet::FinalApplication),
        );
    }
}
