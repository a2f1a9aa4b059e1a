//! Fixed-timestep tick loop.
//!
//! The [`TickLoop`] owns a [`World`] and a list of named systems. Each tick
//! runs every system once, synchronously, in registration order, then
//! advances the tick counter. Systems get `&mut World` and may spawn, destroy
//! and query freely; nothing runs concurrently with them.
//!
//! # Example
//!
//! ```
//! use sim_engine::tick::{TickConfig, TickLoop};
//! use sim_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Counter(u32);
//!
//! let mut world = World::new();
//! let counter = world.declare_component_type::<Counter>("counter");
//! world.spawn(counter.instantiate()).unwrap();
//!
//! let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
//! tick_loop.add_system("count", move |world| {
//!     for (_e, c) in world.query(&counter)?.iter() {
//!         c.borrow_mut().0 += 1;
//!     }
//!     Ok(())
//! });
//!
//! tick_loop.run_ticks(10).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use sim_ecs::world::World;
use sim_ecs::EcsError;

use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl TickConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that `fixed_dt` is positive and finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fixed_dt > 0.0 && self.fixed_dt.is_finite() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig {
                details: format!("fixed_dt must be positive and finite, got {}", self.fixed_dt),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last completed tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// A system run once per tick against the world.
///
/// Systems are closures so they can capture the component type factories
/// they operate on.
pub type SystemFn = Box<dyn FnMut(&mut World) -> Result<(), EcsError>>;

/// A named system in the loop.
struct RegisteredSystem {
    /// Human-readable name (e.g. `"physics"`, `"input"`).
    name: String,
    func: SystemFn,
}

impl fmt::Debug for RegisteredSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Runs a fixed sequence of systems against one world, once per tick.
#[derive(Debug)]
pub struct TickLoop {
    /// The ECS world every system operates on.
    world: World,
    /// Ordered list of systems to run each tick.
    systems: Vec<RegisteredSystem>,
    /// Number of completed ticks.
    tick_counter: u64,
    /// Configuration used to create this tick loop.
    config: TickConfig,
    /// Diagnostics from the last completed tick.
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a new tick loop with the given world and configuration.
    pub fn new(world: World, config: TickConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            world,
            systems: Vec::new(),
            tick_counter: 0,
            config,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Register a system to be run each tick, after every system registered
    /// before it.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system<F>(&mut self, name: &str, func: F)
    where
        F: FnMut(&mut World) -> Result<(), EcsError> + 'static,
    {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func: Box::new(func),
        });
    }

    /// Execute one tick: every system in order, then advance the counter.
    ///
    /// If a system fails, the remaining systems are skipped, the counter is
    /// not advanced and the error names the failing system.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());

        for system in &mut self.systems {
            let sys_start = Instant::now();
            if let Err(source) = (system.func)(&mut self.world) {
                warn!(
                    system = %system.name,
                    tick = self.tick_counter,
                    error = %source,
                    "system failed, aborting tick"
                );
                return Err(EngineError::SystemFailed {
                    system: system.name.clone(),
                    source,
                });
            }
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };
        trace!(tick = self.tick_counter, "tick complete");
        Ok(())
    }

    /// Run `count` ticks, stopping at the first failure.
    pub fn run_ticks(&mut self, count: u64) -> Result<(), EngineError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid drift from repeated
    /// addition.
    pub fn elapsed(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// Read-only access to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the ECS world, for setup between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Give the world back, dropping the systems.
    pub fn into_world(self) -> World {
        self.world
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Diagnostics from the last completed tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
