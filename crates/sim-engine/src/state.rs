//! A stack of game states (menu, gameplay, pause overlay, ...).
//!
//! Only the top state is updated each frame, but every state is drawn from
//! the bottom up so overlays render on top of what they cover. Errors from a
//! state's callbacks surface as [`EngineError::Ecs`].

use std::fmt;

use tracing::debug;

use sim_ecs::world::World;
use sim_ecs::EcsError;

use crate::EngineError;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// One screen or mode of the game.
pub trait GameState {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called when the state becomes active through a push or change.
    fn enter(&mut self, _world: &mut World) -> Result<(), EcsError> {
        Ok(())
    }

    /// Advance the state by one frame. Only called on the top state.
    fn update(&mut self, world: &mut World) -> Result<(), EcsError>;

    /// Render the state. Called on every state in the stack.
    fn draw(&self, _world: &World) {}

    /// Called when the state is popped or replaced.
    fn leave(&mut self, _world: &mut World) -> Result<(), EcsError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StateStack
// ---------------------------------------------------------------------------

/// Ordered stack of [`GameState`]s; the last element is the active one.
#[derive(Default)]
pub struct StateStack {
    stack: Vec<Box<dyn GameState>>,
}

impl fmt::Debug for StateStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stack.iter().map(|s| s.name()))
            .finish()
    }
}

impl StateStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the top state with `state`.
    ///
    /// The current top (if any) leaves first, then `state` enters. On an empty
    /// stack this behaves like [`push_state`](Self::push_state).
    pub fn change_state(
        &mut self,
        world: &mut World,
        mut state: Box<dyn GameState>,
    ) -> Result<(), EngineError> {
        if let Some(mut current) = self.stack.pop() {
            current.leave(world)?;
            debug!(from = current.name(), to = state.name(), "state changed");
        } else {
            debug!(to = state.name(), "initial state");
        }
        state.enter(world)?;
        self.stack.push(state);
        Ok(())
    }

    /// Push `state` on top of the current one and enter it.
    pub fn push_state(
        &mut self,
        world: &mut World,
        mut state: Box<dyn GameState>,
    ) -> Result<(), EngineError> {
        state.enter(world)?;
        debug!(state = state.name(), depth = self.stack.len() + 1, "state pushed");
        self.stack.push(state);
        Ok(())
    }

    /// Pop the top state, letting it leave. Returns it, or `None` if the
    /// stack was empty.
    pub fn pop_state(
        &mut self,
        world: &mut World,
    ) -> Result<Option<Box<dyn GameState>>, EngineError> {
        let Some(mut state) = self.stack.pop() else {
            return Ok(None);
        };
        state.leave(world)?;
        debug!(state = state.name(), depth = self.stack.len(), "state popped");
        Ok(Some(state))
    }

    /// Update the top state only.
    pub fn update(&mut self, world: &mut World) -> Result<(), EngineError> {
        if let Some(state) = self.stack.last_mut() {
            state.update(world)?;
        }
        Ok(())
    }

    /// Draw every state, bottom to top.
    pub fn draw(&self, world: &World) {
        for state in &self.stack {
            state.draw(world);
        }
    }

    /// Name of the active state.
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(|s| s.name())
    }

    /// Number of stacked states.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether no state is active.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
