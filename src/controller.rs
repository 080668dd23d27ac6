//! The movement state machine.
//!
//! [`PlatformerController`] holds everything that persists between ticks. One
//! call to [`PlatformerController::tick`] advances it by exactly one fixed step:
//!
//! 1. collisions (landing, leaving ground, ceiling bonk)
//! 2. ladders (mount, dismount, snap to centre)
//! 3. jumping (ground, coyote, buffered, ladder and air jumps)
//! 4. horizontal speed
//! 5. vertical speed (ladder, slopes, gravity)
//! 6. writing the velocity to the body
//!
//! Every time window is a comparison of tick indices, so the simulation is
//! independent of render frame rate.

use bevy::prelude::*;

use crate::backend::CharacterBody;
use crate::config::StatsConfig;
use crate::detection::CollisionReport;
use crate::events::{ControllerEvent, ControllerObservers};
use crate::intent::FrameInput;
use crate::math::{approximately, move_towards, move_towards_vec, sign_or_positive, smooth_damp};

/// Horizontal facing, toggled only by input.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// How an externally applied velocity is integrated.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceKind {
    /// Added directly to the movement speed, then governed by the normal
    /// acceleration and deceleration.
    Burst,
    /// Added to a separate accumulator that decays toward zero at
    /// `external_velocity_decay`.
    Decay,
}

/// Platformer movement state for one character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// let stats = StatsConfig::platformer();
/// let mut controller = PlatformerController::new(&stats);
/// let mut body = KinematicBody::new(Vec2::ZERO);
///
/// // Land, then jump on the next tick
/// let ground = CollisionReport::grounded(Vec2::Y);
/// controller.tick(&stats, &FrameInput::default(), &ground, &mut body, 1.0 / 60.0);
/// let events = controller.tick(
///     &stats,
///     &FrameInput::default().with_jump_pressed(),
///     &ground,
///     &mut body,
///     1.0 / 60.0,
/// );
///
/// assert_eq!(events, &[ControllerEvent::Jumped { air_jump: false }]);
/// assert!(body.velocity.y > 0.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[require(CollisionReport, FrameInput)]
pub struct PlatformerController {
    // === Kinematics ===
    speed: Vec2,
    external_velocity: Vec2,
    facing: Facing,

    // === Grounding ===
    grounded: bool,
    ground_normal: Vec2,
    frame_left_grounded: Option<u64>,

    // === Jumping ===
    jump_to_consume: bool,
    ended_jump_early: bool,
    coyote_usable: bool,
    buffered_jump_usable: bool,
    frame_jump_pressed: Option<u64>,
    air_jumps_remaining: u32,

    // === Ladders ===
    on_ladder: bool,
    frame_left_ladder: Option<u64>,
    ladder_snap_velocity: Vec2,

    // === Control ===
    has_control: bool,
    frame: u64,

    /// Events produced by the most recent tick.
    #[reflect(ignore)]
    events: Vec<ControllerEvent>,
}

impl Default for PlatformerController {
    fn default() -> Self {
        Self {
            speed: Vec2::ZERO,
            external_velocity: Vec2::ZERO,
            facing: Facing::Right,
            grounded: false,
            ground_normal: Vec2::ZERO,
            frame_left_grounded: None,
            jump_to_consume: false,
            ended_jump_early: false,
            coyote_usable: false,
            buffered_jump_usable: false,
            frame_jump_pressed: None,
            air_jumps_remaining: 0,
            on_ladder: false,
            frame_left_ladder: None,
            ladder_snap_velocity: Vec2::ZERO,
            has_control: true,
            frame: 0,
            events: Vec::new(),
        }
    }
}

impl PlatformerController {
    /// Fresh controller: airborne, facing right, in control, with a full set of
    /// air jumps.
    pub fn new(stats: &StatsConfig) -> Self {
        Self {
            air_jumps_remaining: stats.max_air_jumps,
            ..default()
        }
    }

    // === Accessors ===

    /// Internal movement speed (excluding external velocity).
    pub fn speed(&self) -> Vec2 {
        self.speed
    }

    /// Velocity still pending decay from [`ForceKind::Decay`] forces.
    pub fn external_velocity(&self) -> Vec2 {
        self.external_velocity
    }

    /// Last sampled ground normal. Zero when the last sample found no ground.
    pub fn ground_normal(&self) -> Vec2 {
        self.ground_normal
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn on_ladder(&self) -> bool {
        self.on_ladder
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn has_control(&self) -> bool {
        self.has_control
    }

    pub fn air_jumps_remaining(&self) -> u32 {
        self.air_jumps_remaining
    }

    /// Number of ticks simulated so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Events produced by the most recent tick.
    pub fn events(&self) -> &[ControllerEvent] {
        &self.events
    }

    // === External API ===

    /// Push the character from outside (knockback, springs, wind...).
    pub fn apply_external_velocity(&mut self, velocity: Vec2, kind: ForceKind) {
        match kind {
            ForceKind::Burst => self.speed += velocity,
            ForceKind::Decay => self.external_velocity += velocity,
        }
    }

    /// Stop writing velocities to the body until [`restore_control`] is called.
    ///
    /// [`restore_control`]: Self::restore_control
    pub fn revoke_control(&mut self, reset_velocity: bool, body: &mut impl CharacterBody) {
        if reset_velocity {
            body.set_velocity(Vec2::ZERO);
        }
        self.has_control = false;
    }

    /// Resume control. Internal speed restarts from zero.
    pub fn restore_control(&mut self) {
        self.speed = Vec2::ZERO;
        self.has_control = true;
    }

    /// Set the remaining air jumps back to `max_air_jumps`.
    pub fn refill_air_jumps(&mut self, stats: &StatsConfig) {
        self.air_jumps_remaining = stats.max_air_jumps;
    }

    // === Simulation ===

    /// Advance the simulation by one fixed tick and return the events it
    /// produced.
    pub fn tick(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        body: &mut impl CharacterBody,
        dt: f32,
    ) -> &[ControllerEvent] {
        self.events.clear();

        self.begin_tick(input);
        self.resolve_collisions(stats, contacts);
        self.resolve_ladder(stats, input, contacts, body, dt);
        self.resolve_jump(stats, input, contacts, &*body);
        self.resolve_horizontal(stats, input, contacts, &*body, dt);
        self.resolve_vertical(stats, input, contacts, dt);
        self.apply(stats, body, dt);

        &self.events
    }

    /// [`tick`](Self::tick), then deliver every event to `observers` in order.
    pub fn tick_observed(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        body: &mut impl CharacterBody,
        dt: f32,
        observers: &mut ControllerObservers,
    ) -> &[ControllerEvent] {
        self.tick(stats, input, contacts, body, dt);
        for event in &self.events {
            observers.notify(event);
        }
        &self.events
    }

    fn begin_tick(&mut self, input: &FrameInput) {
        self.frame += 1;

        if input.jump_down {
            self.jump_to_consume = true;
            self.frame_jump_pressed = Some(self.frame);
        }
    }

    fn resolve_collisions(&mut self, stats: &StatsConfig, contacts: &CollisionReport) {
        if contacts.touching_ceiling() {
            self.speed.y = self.speed.y.min(0.0);
        }

        if !self.grounded && contacts.touching_ground() {
            self.grounded = true;
            self.reset_jump(stats);
            debug!("Landed at {:.2} units/s", self.speed.y.abs());
            self.events.push(ControllerEvent::GroundedChanged {
                grounded: true,
                impact_speed: self.speed.y.abs(),
            });
        } else if self.grounded && !contacts.touching_ground() {
            self.grounded = false;
            self.frame_left_grounded = Some(self.frame);
            debug!("Left ground on tick {}", self.frame);
            self.events.push(ControllerEvent::GroundedChanged {
                grounded: false,
                impact_speed: 0.0,
            });
        }
    }

    fn resolve_ladder(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        body: &mut impl CharacterBody,
        dt: f32,
    ) {
        if !stats.allow_ladders {
            return;
        }

        let climb = input.movement.y;
        let cooldown_elapsed = match self.frame_left_ladder {
            Some(left) => self.frame > left + u64::from(stats.ladder_cooldown_frames),
            None => true,
        };
        let can_enter = contacts.overlapping_ladder() && cooldown_elapsed;
        let mount_input = climb > stats.vertical_deadzone
            || (!self.grounded && climb < -stats.vertical_deadzone);
        let dismount_input = self.grounded && climb < -stats.vertical_deadzone;

        if !self.on_ladder && can_enter && mount_input {
            self.set_on_ladder(true, stats, contacts);
        } else if self.on_ladder && (!contacts.overlapping_ladder() || dismount_input) {
            self.set_on_ladder(false, stats, contacts);
        }

        if self.on_ladder && input.movement.x == 0.0 && stats.snap_to_ladders && self.has_control {
            if let Some(ladder) = contacts.ladder {
                let position = body.position();
                let target = Vec2::new(ladder.point.x, position.y);
                let snapped = smooth_damp(
                    position,
                    target,
                    &mut self.ladder_snap_velocity,
                    stats.ladder_snap_speed,
                    dt,
                );
                body.set_position(snapped);
            }
        }
    }

    fn set_on_ladder(&mut self, on: bool, stats: &StatsConfig, contacts: &CollisionReport) {
        if self.on_ladder == on {
            return;
        }

        if on {
            self.speed = Vec2::ZERO;
            debug!("Mounted ladder on tick {}", self.frame);
        } else {
            // Block an immediate re-grab after jumping off
            if contacts.overlapping_ladder() {
                self.frame_left_ladder = Some(self.frame);
            }
            debug!("Left ladder on tick {}", self.frame);
        }

        self.on_ladder = on;
        self.refill_air_jumps(stats);
    }

    fn resolve_jump(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        body: &impl CharacterBody,
    ) {
        if self.jump_to_consume || self.has_buffered_jump(stats) {
            if self.grounded || self.on_ladder || self.can_use_coyote(stats) {
                self.normal_jump(stats, contacts);
            } else if self.jump_to_consume && self.air_jumps_remaining > 0 {
                self.air_jump(stats);
            }
        }

        self.jump_to_consume = false;

        if !self.ended_jump_early && !self.grounded && !input.jump_held && body.velocity().y > 0.0 {
            self.ended_jump_early = true;
        }
    }

    fn has_buffered_jump(&self, stats: &StatsConfig) -> bool {
        self.buffered_jump_usable
            && self
                .frame_jump_pressed
                .is_some_and(|pressed| self.frame < pressed + u64::from(stats.jump_buffer_frames))
    }

    fn can_use_coyote(&self, stats: &StatsConfig) -> bool {
        self.coyote_usable
            && !self.grounded
            && self
                .frame_left_grounded
                .is_some_and(|left| self.frame < left + u64::from(stats.coyote_frames))
    }

    /// Ground, coyote, buffered and ladder jumps.
    fn normal_jump(&mut self, stats: &StatsConfig, contacts: &CollisionReport) {
        self.ended_jump_early = false;
        self.buffered_jump_usable = false;
        self.coyote_usable = false;
        self.set_on_ladder(false, stats, contacts);
        self.speed.y = stats.jump_power;
        self.events.push(ControllerEvent::Jumped { air_jump: false });
    }

    fn air_jump(&mut self, stats: &StatsConfig) {
        self.ended_jump_early = false;
        self.air_jumps_remaining -= 1;
        self.speed.y = stats.jump_power;
        self.events.push(ControllerEvent::Jumped { air_jump: true });
    }

    fn reset_jump(&mut self, stats: &StatsConfig) {
        self.coyote_usable = true;
        self.buffered_jump_usable = true;
        self.ended_jump_early = false;
        self.refill_air_jumps(stats);
    }

    fn resolve_horizontal(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        body: &impl CharacterBody,
        dt: f32,
    ) {
        let x = input.movement.x;

        if x > 0.0 && self.facing == Facing::Left {
            self.facing = Facing::Right;
        } else if x < 0.0 && self.facing == Facing::Right {
            self.facing = Facing::Left;
        }

        if x.abs() < stats.horizontal_deadzone {
            let deceleration = if self.grounded {
                stats.ground_deceleration
            } else {
                stats.air_deceleration
            };
            self.speed.x = move_towards(self.speed.x, 0.0, deceleration * dt);
            return;
        }

        // No hidden speed build-up while pushing into a wall
        if contacts.touching_wall()
            && approximately(body.velocity().x, 0.0)
            && sign_or_positive(x) == sign_or_positive(self.speed.x)
        {
            self.speed.x = 0.0;
        }

        let multiplier = if self.on_ladder {
            stats.ladder_shimmy_speed_multiplier
        } else {
            1.0
        };
        let target = x * multiplier * stats.max_speed;
        self.speed.x = move_towards(self.speed.x, target, stats.acceleration * dt);
    }

    fn resolve_vertical(
        &mut self,
        stats: &StatsConfig,
        input: &FrameInput,
        contacts: &CollisionReport,
        dt: f32,
    ) {
        if self.on_ladder {
            let y = input.movement.y;
            let rate = if y > 0.0 {
                stats.ladder_climb_speed
            } else {
                stats.ladder_slide_speed
            };
            self.speed.y = y * rate;
        } else if self.grounded && self.speed.y <= 0.0 {
            self.speed.y = stats.grounding_force;

            match contacts.ground_normal {
                Some(normal) => {
                    self.ground_normal = normal;
                    if !approximately(normal.y, 1.0) {
                        // Follow the slope so walking neither launches nor sinks
                        self.speed.y = self.speed.x * -normal.x / normal.y;
                        if self.speed.x != 0.0 {
                            self.speed.y += stats.grounding_force;
                        }
                    }
                }
                None => self.ground_normal = Vec2::ZERO,
            }
        } else {
            let mut gravity = stats.fall_acceleration;
            if self.ended_jump_early && self.speed.y > 0.0 {
                gravity *= stats.jump_end_early_gravity_modifier;
            }
            self.speed.y = move_towards(self.speed.y, -stats.max_fall_speed, gravity * dt);
        }
    }

    fn apply(&mut self, stats: &StatsConfig, body: &mut impl CharacterBody, dt: f32) {
        if !self.has_control {
            return;
        }

        body.set_velocity(self.speed + self.external_velocity);
        self.external_velocity = move_towards_vec(
            self.external_velocity,
            Vec2::ZERO,
            stats.external_velocity_decay * dt,
        );
    }
}
