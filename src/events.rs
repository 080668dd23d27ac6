//! Controller notifications.
//!
//! Events are produced by the state machine during a tick and delivered
//! synchronously, before the tick returns, to every listener registered on
//! the entity's [`ControllerObservers`], in registration order. Inside bevy
//! they are additionally forwarded as [`ControllerMessage`] events.

use bevy::prelude::*;

/// Something noteworthy that happened during a tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// Landed (`grounded == true`, with the absolute vertical speed at impact)
    /// or left the ground (`grounded == false`, impact speed zero).
    GroundedChanged { grounded: bool, impact_speed: f32 },
    /// A jump executed. `air_jump` distinguishes mid-air jumps from ground,
    /// coyote, buffered and ladder jumps.
    Jumped { air_jump: bool },
}

/// Handle returned by [`ControllerObservers::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&ControllerEvent) + Send + Sync>;

/// Listeners notified synchronously of a controller's events.
///
/// Listeners only ever see the event, so they cannot reach back into the
/// controller that produced it.
#[derive(Component, Default)]
pub struct ControllerObservers {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl ControllerObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Listeners run in the order they were registered.
    pub fn register(
        &mut self,
        listener: impl FnMut(&ControllerEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener.
    pub fn notify(&mut self, event: &ControllerEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ControllerObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerObservers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A [`ControllerEvent`] tagged with the entity that produced it.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ControllerMessage {
    pub entity: Entity,
    pub event: ControllerEvent,
}
