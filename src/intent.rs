//! Input snapshots.
//!
//! [`FrameInput`] is the per-tick contract consumed by the controller: one
//! snapshot per fixed tick, with button *edges* true only on the tick the
//! button changed. [`ControlIntent`] is the convenience side for game code:
//! write the current button *levels* whenever you like, and
//! `latch_frame_input` turns them into edges once per tick. A jump pressed
//! through [`ControlIntent::set_jump`] is remembered until the next tick, so a
//! tap shorter than one fixed step still jumps.

use bevy::prelude::*;

/// Input for exactly one simulation tick.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_controller::prelude::*;
///
/// let idle = FrameInput::default();
/// let pressed = idle.advance(Vec2::new(1.0, 0.0), true, false);
/// assert!(pressed.jump_down);
///
/// // Still held next tick: level stays, edge is gone
/// let held = pressed.advance(Vec2::new(1.0, 0.0), true, false);
/// assert!(held.jump_held);
/// assert!(!held.jump_down);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct FrameInput {
    /// Movement direction, each component in [-1, 1].
    pub movement: Vec2,
    /// Jump went from released to pressed this tick.
    pub jump_down: bool,
    /// Jump is currently pressed.
    pub jump_held: bool,
    /// Interact went from released to pressed this tick.
    pub interact_down: bool,
    /// Interact is currently pressed.
    pub interact_held: bool,
    /// Interact went from pressed to released this tick.
    pub interact_up: bool,
}

impl FrameInput {
    /// Snapshot with only movement set.
    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement: clamp_axis(movement),
            ..default()
        }
    }

    /// Builder: press jump this tick (edge and level).
    pub fn with_jump_pressed(mut self) -> Self {
        self.jump_down = true;
        self.jump_held = true;
        self
    }

    /// Builder: jump held from an earlier tick (level only).
    pub fn with_jump_held(mut self) -> Self {
        self.jump_held = true;
        self
    }

    /// Derive the next tick's snapshot from button levels, computing edges
    /// against this snapshot.
    pub fn advance(&self, movement: Vec2, jump_held: bool, interact_held: bool) -> Self {
        Self {
            movement: clamp_axis(movement),
            jump_down: jump_held && !self.jump_held,
            jump_held,
            interact_down: interact_held && !self.interact_held,
            interact_held,
            interact_up: !interact_held && self.interact_held,
        }
    }
}

/// Button levels written by game code, AI or network input.
///
/// Entities that have this component get their [`FrameInput`] rebuilt from it
/// at the start of every fixed tick.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct ControlIntent {
    /// Desired movement direction (-1.0 to 1.0 on each axis).
    pub movement: Vec2,
    /// Whether jump is held.
    pub jump: bool,
    /// Whether interact is held.
    pub interact: bool,
    /// A press seen by `set_jump` that no tick has consumed yet.
    jump_latched: bool,
}

impl ControlIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement direction. Clamped to [-1, 1] per axis.
    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = clamp_axis(movement);
    }

    /// Set whether jump is held. A press is kept for the next tick even if
    /// the button is released again before it runs.
    pub fn set_jump(&mut self, held: bool) {
        if held && !self.jump {
            self.jump_latched = true;
        }
        self.jump = held;
    }

    /// Whether a jump press is waiting for the next tick.
    pub fn jump_latched(&self) -> bool {
        self.jump_latched
    }

    /// Build the next tick's snapshot from these levels, consuming any
    /// latched jump press.
    pub fn latch(&mut self, previous: &FrameInput) -> FrameInput {
        let mut input = previous.advance(self.movement, self.jump, self.interact);
        input.jump_down |= std::mem::take(&mut self.jump_latched);
        input
    }

    /// Set whether interact is held.
    pub fn set_interact(&mut self, held: bool) {
        self.interact = held;
    }

    /// Clear movement and release all buttons.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn clamp_axis(movement: Vec2) -> Vec2 {
    movement.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_input_default_is_idle() {
        let input = FrameInput::default();
        assert_eq!(input.movement, Vec2::ZERO);
        assert!(!input.jump_down);
        assert!(!input.jump_held);
    }

    #[test]
    fn jump_edge_only_on_transition() {
        let first = FrameInput::default().advance(Vec2::ZERO, true, false);
        assert!(first.jump_down);

        let second = first.advance(Vec2::ZERO, true, false);
        assert!(!second.jump_down);
        assert!(second.jump_held);

        let released = second.advance(Vec2::ZERO, false, false);
        assert!(!released.jump_down);
        assert!(!released.jump_held);

        let again = released.advance(Vec2::ZERO, true, false);
        assert!(again.jump_down);
    }

    #[test]
    fn interact_edges() {
        let down = FrameInput::default().advance(Vec2::ZERO, false, true);
        assert!(down.interact_down);
        assert!(down.interact_held);
        assert!(!down.interact_up);

        let up = down.advance(Vec2::ZERO, false, false);
        assert!(!up.interact_down);
        assert!(!up.interact_held);
        assert!(up.interact_up);
    }

    #[test]
    fn movement_is_clamped() {
        let input = FrameInput::moving(Vec2::new(3.0, -2.0));
        assert_eq!(input.movement, Vec2::new(1.0, -1.0));

        let mut intent = ControlIntent::new();
        intent.set_movement(Vec2::new(-5.0, 0.5));
        assert_eq!(intent.movement, Vec2::new(-1.0, 0.5));
    }

    #[test]
    fn control_intent_clear() {
        let mut intent = ControlIntent::new();
        intent.set_movement(Vec2::X);
        intent.set_jump(true);
        intent.set_interact(true);

        intent.clear();
        assert_eq!(intent, ControlIntent::default());
    }

    #[test]
    fn tap_between_ticks_still_jumps() {
        let mut intent = ControlIntent::new();
        intent.set_jump(true);
        intent.set_jump(false);
        assert!(intent.jump_latched());

        let input = intent.latch(&FrameInput::default());
        assert!(input.jump_down);
        assert!(!input.jump_held);
        assert!(!intent.jump_latched());

        // Consumed: the following tick sees nothing
        let next = intent.latch(&input);
        assert!(!next.jump_down);
    }

    #[test]
    fn held_press_is_one_edge() {
        let mut intent = ControlIntent::new();
        intent.set_jump(true);

        let first = intent.latch(&FrameInput::default());
        assert!(first.jump_down && first.jump_held);

        // Re-asserting the level is not a new press
        intent.set_jump(true);
        let second = intent.latch(&first);
        assert!(!second.jump_down);
        assert!(second.jump_held);
    }

    #[test]
    fn builders() {
        let input = FrameInput::moving(Vec2::X).with_jump_pressed();
        assert!(input.jump_down && input.jump_held);

        let held = FrameInput::default().with_jump_held();
        assert!(!held.jump_down && held.jump_held);
    }
}
