//! Headless bouncing-rectangles demo.
//!
//! Rectangles spawn in batches of four each frame until the target count is
//! reached, then bounce around a 240x136 screen. The game runs as a state on a
//! [`StateStack`]; every 60 frames a short status line is logged.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example bouncing_rects -p sim-engine -- 2000

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::info;

use sim_engine::prelude::*;

const WIDTH: f64 = 240.0;
const HEIGHT: f64 = 136.0;
const FRAMES: u32 = 600;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Default)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug, Clone)]
struct Size {
    w: f64,
    h: f64,
}

#[derive(Debug, Clone, Default)]
struct Color(u32);

// ---------------------------------------------------------------------------
// Game state
// ---------------------------------------------------------------------------

struct BounceState {
    rng: Pcg64,
    target: usize,
    frame: u32,
    position: ComponentType<Position>,
    velocity: ComponentType<Velocity>,
    size: ComponentType<Size>,
    color: ComponentType<Color>,
}

impl BounceState {
    fn new(world: &mut World, target: usize) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(0xb0b5),
            target,
            frame: 0,
            position: world.declare_component_type("position"),
            velocity: world.declare_component_type("velocity"),
            size: world.declare_component_type_with("size", Size { w: 16.0, h: 16.0 }),
            color: world.declare_component_type("color"),
        }
    }

    fn spawn_rect(&mut self, world: &mut World) -> Result<Entity, EcsError> {
        let rng = &mut self.rng;
        world.spawn((
            self.position.wrap(Position {
                x: rng.gen_range(0.0..WIDTH),
                y: rng.gen_range(0.0..HEIGHT),
            }),
            self.velocity.wrap(Velocity {
                dx: rng.gen_range(-1.0..1.0),
                dy: rng.gen_range(-1.0..1.0),
            }),
            self.size.instantiate(),
            self.color.wrap(Color(rng.gen_range(0..0xff_ffff))),
        ))
    }

    /// Flip velocity away from any wall the rectangle has crossed.
    fn bounce(&self, world: &mut World) -> Result<(), EcsError> {
        for (_e, pos, vel, size) in world
            .query((&self.position, &self.velocity, &self.size))?
            .iter()
        {
            let pos = pos.borrow();
            let size = size.borrow();
            let mut vel = vel.borrow_mut();
            if pos.x < 0.0 {
                vel.dx = vel.dx.abs();
            }
            if pos.x + size.w > WIDTH {
                vel.dx = -vel.dx.abs();
            }
            if pos.y < 0.0 {
                vel.dy = vel.dy.abs();
            }
            if pos.y + size.h > HEIGHT {
                vel.dy = -vel.dy.abs();
            }
        }
        Ok(())
    }

    fn apply_velocity(&self, world: &mut World) -> Result<(), EcsError> {
        for (_e, pos, vel) in world.query((&self.position, &self.velocity))?.iter() {
            let vel = vel.borrow();
            let mut pos = pos.borrow_mut();
            pos.x += vel.dx;
            pos.y += vel.dy;
        }
        Ok(())
    }
}

impl GameState for BounceState {
    fn name(&self) -> &str {
        "bounce"
    }

    fn enter(&mut self, world: &mut World) -> Result<(), EcsError> {
        info!(target = self.target, "spawning rectangles");
        self.spawn_rect(world)?;
        Ok(())
    }

    fn update(&mut self, world: &mut World) -> Result<(), EcsError> {
        self.frame += 1;
        if world.entity_count() < self.target {
            for _ in 0..4 {
                self.spawn_rect(world)?;
            }
        }
        self.bounce(world)?;
        self.apply_velocity(world)?;

        if self.frame % 60 == 0 {
            let stats = world.cache_stats();
            info!(
                frame = self.frame,
                rects = world.entity_count(),
                hits = stats.hits,
                misses = stats.misses,
                "status"
            );
        }
        Ok(())
    }

    fn draw(&self, world: &World) {
        // No screen; count what would be visible.
        let Some(positions) = world.store(&self.position) else {
            return;
        };
        let visible = positions
            .entities()
            .into_iter()
            .filter_map(|e| positions.get(e))
            .filter(|pos| {
                let pos = pos.borrow();
                (0.0..WIDTH).contains(&pos.x) && (0.0..HEIGHT).contains(&pos.y)
            })
            .count();
        tracing::trace!(visible, "draw");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let target: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 1_000,
    };

    let mut world = World::new();
    let state = BounceState::new(&mut world, target);
    let mut states = StateStack::new();
    states.change_state(&mut world, Box::new(state))?;

    for _ in 0..FRAMES {
        states.update(&mut world)?;
        states.draw(&world);
    }

    let stats = world.cache_stats();
    println!(
        "{} rectangles after {FRAMES} frames, {} cache hits / {} misses",
        world.entity_count(),
        stats.hits,
        stats.misses
    );
    Ok(())
}
