//! Sim Engine -- frame driver on top of the [`sim_ecs`] world.
//!
//! This crate provides the pieces that run a game against one explicitly
//! owned [`World`](sim_ecs::world::World): a fixed-timestep [`TickLoop`]
//! that runs systems in a fixed order, and a [`StateStack`] for menu /
//! gameplay / overlay states.
//!
//! # Quick Start
//!
//! ```
//! use sim_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Score(u32);
//!
//! let mut world = World::new();
//! let score = world.declare_component_type::<Score>("score");
//! let player = world.spawn(score.instantiate()).unwrap();
//!
//! let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
//! let s = score.clone();
//! tick_loop.add_system("scoring", move |world| {
//!     if let Some(score) = world.get_component(player, &s) {
//!         score.borrow_mut().0 += 10;
//!     }
//!     Ok(())
//! });
//!
//! tick_loop.run_ticks(100).unwrap();
//! let world = tick_loop.into_world();
//! assert_eq!(world.get_component(player, &score).unwrap().get().0, 1_000);
//! ```

#![deny(unsafe_code)]

pub mod state;
pub mod tick;

/// Re-export the ECS crate for convenience.
pub use sim_ecs;

pub use state::{GameState, StateStack};
pub use tick::{TickConfig, TickLoop};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while driving the simulation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An ECS operation failed outside of any system.
    #[error(transparent)]
    Ecs(#[from] sim_ecs::EcsError),

    /// A system returned an error; the rest of the tick was skipped.
    #[error("system '{system}' failed: {source}")]
    SystemFailed {
        system: String,
        source: sim_ecs::EcsError,
    },

    /// A tick configuration was malformed or out of range.
    #[error("invalid tick configuration: {details}")]
    InvalidConfig { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use sim_ecs::prelude::*;

    pub use crate::state::{GameState, StateStack};
    pub use crate::tick::{SystemFn, TickConfig, TickDiagnostics, TickLoop};
    pub use crate::EngineError;
}
