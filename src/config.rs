//! Controller configuration.
//!
//! [`StatsConfig`] is the immutable tuning bundle shared by every controller
//! that uses it. Ladder support is a capability of the config rather than a
//! separate controller type: leave `allow_ladders` off for a plain platformer.

use std::ops::Deref;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning parameters for the platformer controller.
///
/// Frame-count windows (`coyote_frames`, `jump_buffer_frames`,
/// `ladder_cooldown_frames`) are measured in fixed simulation ticks, so they
/// behave identically regardless of render frame rate.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    // === Movement Settings ===
    /// Top horizontal movement speed (units/second).
    pub max_speed: f32,

    /// Capacity to gain horizontal speed (units/second^2).
    pub acceleration: f32,

    /// Pace at which the character comes to a stop on the ground.
    pub ground_deceleration: f32,

    /// Deceleration in the air, only after stopping input mid-air.
    pub air_deceleration: f32,

    /// Constant downward speed applied while grounded. Keeps the body seated
    /// on slopes. Zero or negative.
    pub grounding_force: f32,

    /// Minimum horizontal input before left/right is recognised.
    /// Avoids drifting with sticky controllers.
    pub horizontal_deadzone: f32,

    // === Jump Settings ===
    /// Number of jumps allowed in the air. 1 is a standard double jump.
    pub max_air_jumps: u32,

    /// Vertical speed applied immediately when jumping.
    pub jump_power: f32,

    /// Terminal fall speed.
    pub max_fall_speed: f32,

    /// Capacity to gain fall speed.
    pub fall_acceleration: f32,

    /// Gravity multiplier while rising after the jump button was released early.
    pub jump_end_early_gravity_modifier: f32,

    /// Ticks after leaving a ledge during which a jump still counts as grounded.
    pub coyote_frames: u32,

    /// Ticks a jump press is remembered before landing.
    pub jump_buffer_frames: u32,

    // === Ladder Settings ===
    /// Whether ladders can be climbed at all.
    pub allow_ladders: bool,

    /// Smoothly centre the character on the ladder when there is no
    /// horizontal input.
    pub snap_to_ladders: bool,

    /// Minimum vertical input before up/down is recognised.
    pub vertical_deadzone: f32,

    /// Smoothing time for the ladder snap (seconds, lower is snappier).
    pub ladder_snap_speed: f32,

    /// Horizontal speed multiplier while on a ladder.
    pub ladder_shimmy_speed_multiplier: f32,

    /// Climbing speed.
    pub ladder_climb_speed: f32,

    /// Sliding-down speed.
    pub ladder_slide_speed: f32,

    /// Ticks after leaving a ladder before it can be grabbed again.
    pub ladder_cooldown_frames: u32,

    // === Collision Settings ===
    /// Layer bits the character itself lives on. Excluded from ground and
    /// ceiling probes.
    pub player_layer: u32,

    /// Layer bits of solid level geometry, used for wall detection.
    pub ground_layer: u32,

    /// Layer bits of ladder trigger volumes.
    pub ladder_layer: u32,

    /// Detection distance for grounding and ceiling probes.
    pub grounder_distance: f32,

    /// Size of the box used to detect walls and ladders around the body.
    /// Should be wider than the character's collider.
    pub wall_detector_size: Vec2,

    // === External Settings ===
    /// Rate at which externally applied velocity decays (units/second^2).
    pub external_velocity_decay: f32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            // Movement settings
            max_speed: 14.0,
            acceleration: 120.0,
            ground_deceleration: 60.0,
            air_deceleration: 30.0,
            grounding_force: -1.5,
            horizontal_deadzone: 0.1,

            // Jump settings
            max_air_jumps: 1,
            jump_power: 36.0,
            max_fall_speed: 40.0,
            fall_acceleration: 110.0,
            jump_end_early_gravity_modifier: 3.0,
            coyote_frames: 7,
            jump_buffer_frames: 7,

            // Ladder settings (off unless requested)
            allow_ladders: false,
            snap_to_ladders: true,
            vertical_deadzone: 0.3,
            ladder_snap_speed: 0.05,
            ladder_shimmy_speed_multiplier: 0.5,
            ladder_climb_speed: 8.0,
            ladder_slide_speed: 12.0,
            ladder_cooldown_frames: 8,

            // Collision settings
            player_layer: 1 << 1,
            ground_layer: 1 << 0,
            ladder_layer: 1 << 2,
            grounder_distance: 0.1,
            wall_detector_size: Vec2::new(0.75, 1.25),

            // External settings
            external_velocity_decay: 100.0,
        }
    }
}

impl StatsConfig {
    /// Plain platformer: running, jumping, double jump. No ladders.
    pub fn platformer() -> Self {
        Self::default()
    }

    /// Platformer with ladder climbing enabled.
    pub fn climber() -> Self {
        Self {
            allow_ladders: true,
            ..default()
        }
    }

    /// Parse stats from JSON and validate them.
    ///
    /// Missing fields fall back to [`StatsConfig::default`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let stats: Self = serde_json::from_str(json)?;
        stats.validate()?;
        Ok(stats)
    }

    /// Check the invariants the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("ground_deceleration", self.ground_deceleration),
            ("air_deceleration", self.air_deceleration),
            ("horizontal_deadzone", self.horizontal_deadzone),
            ("jump_power", self.jump_power),
            ("max_fall_speed", self.max_fall_speed),
            ("fall_acceleration", self.fall_acceleration),
            (
                "jump_end_early_gravity_modifier",
                self.jump_end_early_gravity_modifier,
            ),
            ("vertical_deadzone", self.vertical_deadzone),
            ("ladder_snap_speed", self.ladder_snap_speed),
            (
                "ladder_shimmy_speed_multiplier",
                self.ladder_shimmy_speed_multiplier,
            ),
            ("ladder_climb_speed", self.ladder_climb_speed),
            ("ladder_slide_speed", self.ladder_slide_speed),
            ("grounder_distance", self.grounder_distance),
            ("wall_detector_size.x", self.wall_detector_size.x),
            ("wall_detector_size.y", self.wall_detector_size.y),
            ("external_velocity_decay", self.external_velocity_decay),
        ];

        for (field, value) in non_negative {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !self.grounding_force.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "grounding_force",
                value: self.grounding_force,
            });
        }
        if self.grounding_force > 0.0 {
            return Err(ConfigError::PositiveGroundingForce(self.grounding_force));
        }

        Ok(())
    }

    /// Builder: enable or disable ladder climbing.
    pub fn with_ladders(mut self, enabled: bool) -> Self {
        self.allow_ladders = enabled;
        self
    }

    /// Builder: set movement parameters.
    pub fn with_movement(mut self, max_speed: f32, acceleration: f32) -> Self {
        self.max_speed = max_speed;
        self.acceleration = acceleration;
        self
    }

    /// Builder: set ground and air deceleration.
    pub fn with_deceleration(mut self, ground: f32, air: f32) -> Self {
        self.ground_deceleration = ground;
        self.air_deceleration = air;
        self
    }

    /// Builder: set jump power.
    pub fn with_jump_power(mut self, power: f32) -> Self {
        self.jump_power = power;
        self
    }

    /// Builder: set number of air jumps.
    pub fn with_air_jumps(mut self, jumps: u32) -> Self {
        self.max_air_jumps = jumps;
        self
    }

    /// Builder: set coyote window in ticks.
    pub fn with_coyote_frames(mut self, frames: u32) -> Self {
        self.coyote_frames = frames;
        self
    }

    /// Builder: set jump buffer window in ticks.
    pub fn with_jump_buffer_frames(mut self, frames: u32) -> Self {
        self.jump_buffer_frames = frames;
        self
    }

    /// Builder: set ladder re-grab cooldown in ticks.
    pub fn with_ladder_cooldown_frames(mut self, frames: u32) -> Self {
        self.ladder_cooldown_frames = frames;
        self
    }

    /// Builder: enable or disable snapping onto the ladder's centre.
    pub fn with_ladder_snap(mut self, enabled: bool) -> Self {
        self.snap_to_ladders = enabled;
        self
    }

    /// Builder: set the collision layers.
    pub fn with_layers(mut self, player: u32, ground: u32, ladder: u32) -> Self {
        self.player_layer = player;
        self.ground_layer = ground;
        self.ladder_layer = ladder;
        self
    }

    /// Builder: set the grounder probe distance.
    pub fn with_grounder_distance(mut self, distance: f32) -> Self {
        self.grounder_distance = distance;
        self
    }

    /// Builder: set the wall/ladder detector box size.
    pub fn with_wall_detector_size(mut self, size: Vec2) -> Self {
        self.wall_detector_size = size;
        self
    }

    /// Builder: set the external velocity decay rate.
    pub fn with_external_velocity_decay(mut self, decay: f32) -> Self {
        self.external_velocity_decay = decay;
        self
    }
}

/// Shared handle to a [`StatsConfig`].
///
/// Many controllers may point at the same stats. The handle is cheap to clone
/// and the stats behind it are never mutated during a session.
#[derive(Component, Debug, Clone)]
pub struct ControllerStats(Arc<StatsConfig>);

impl ControllerStats {
    /// Wrap owned stats in a new shared handle.
    pub fn new(stats: StatsConfig) -> Self {
        Self(Arc::new(stats))
    }

    /// Clone the shared pointer.
    pub fn shared(&self) -> Arc<StatsConfig> {
        Arc::clone(&self.0)
    }
}

impl From<Arc<StatsConfig>> for ControllerStats {
    fn from(stats: Arc<StatsConfig>) -> Self {
        Self(stats)
    }
}

impl Deref for ControllerStats {
    type Target = StatsConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
