//! Engine-level scenarios: many entities under several systems for many
//! ticks, and a state stack driving gameplay with a pause overlay.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use sim_engine::prelude::*;

// -- Component types --------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Lifetime(u32);

#[derive(Debug, Clone, Default, PartialEq)]
struct Score(i64);

// -- Simulation -------------------------------------------------------------

struct Outcome {
    alive: usize,
    position_sum: f64,
    score_sum: i64,
    hits: u64,
}

/// Spawn `count` entities from a fixed seed and run four systems for `ticks`.
fn run_simulation(seed: u64, count: usize, ticks: u64) -> Outcome {
    let mut world = World::new();
    let position = world.declare_component_type::<Position>("position");
    let velocity = world.declare_component_type::<Velocity>("velocity");
    let lifetime = world.declare_component_type_with("lifetime", Lifetime(30));
    let score = world.declare_component_type::<Score>("score");

    let mut rng = Pcg64::seed_from_u64(seed);
    for i in 0..count {
        let mut bundle = ComponentBundle::new();
        bundle.add(position.wrap(Position {
            x: rng.gen_range(0.0..320.0),
            y: rng.gen_range(0.0..240.0),
        }));
        if i % 2 == 0 {
            bundle.add(velocity.wrap(Velocity {
                dx: rng.gen_range(-2.0..2.0),
                dy: rng.gen_range(-2.0..2.0),
            }));
        }
        if i % 10 == 0 {
            bundle.add(lifetime.instantiate_with(|l| l.0 = rng.gen_range(1..50)));
        }
        if i % 3 == 0 {
            bundle.add_default(&score);
        }
        world.spawn(bundle).unwrap();
    }

    let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();

    let (p, v) = (position.clone(), velocity.clone());
    tick_loop.add_system("movement", move |world| {
        for (_e, pos, vel) in world.query((&p, &v))?.iter() {
            let vel = vel.borrow();
            let mut pos = pos.borrow_mut();
            pos.x += vel.dx;
            pos.y += vel.dy;
        }
        Ok(())
    });

    let s = score.clone();
    tick_loop.add_system("scoring", move |world| {
        for (_e, score) in world.query(&s)?.iter() {
            score.borrow_mut().0 += 1;
        }
        Ok(())
    });

    let l = lifetime.clone();
    tick_loop.add_system("lifetime", move |world| {
        let expired: Vec<Entity> = world
            .query(&l)?
            .iter()
            .filter_map(|(e, life)| {
                let mut life = life.borrow_mut();
                life.0 = life.0.saturating_sub(1);
                (life.0 == 0).then_some(*e)
            })
            .collect();
        for e in expired {
            world.destroy(e)?;
        }
        Ok(())
    });

    let (p, v) = (position.clone(), velocity.clone());
    tick_loop.add_system("friction", move |world| {
        for (_e, _pos, vel) in world.query((&p, &v))?.iter() {
            let mut vel = vel.borrow_mut();
            vel.dx *= 0.99;
            vel.dy *= 0.99;
        }
        Ok(())
    });

    tick_loop.run_ticks(ticks).unwrap();
    assert_eq!(tick_loop.tick_count(), ticks);

    let mut world = tick_loop.into_world();
    let hits = world.cache_stats().hits;
    let position_sum: f64 = world
        .query(&position)
        .unwrap()
        .iter()
        .map(|(_e, pos)| {
            let pos = pos.borrow();
            pos.x + pos.y
        })
        .sum();
    let score_sum: i64 = world
        .query(&score)
        .unwrap()
        .iter()
        .map(|(_e, s)| s.get().0)
        .sum();

    Outcome {
        alive: world.entity_count(),
        position_sum,
        score_sum,
        hits,
    }
}

#[test]
fn simulation_is_deterministic() {
    let a = run_simulation(7, 2_000, 200);
    let b = run_simulation(7, 2_000, 200);

    assert_eq!(a.alive, b.alive);
    assert_eq!(a.position_sum.to_bits(), b.position_sum.to_bits());
    assert_eq!(a.score_sum, b.score_sum);
}

#[test]
fn lifetimes_expire_and_scores_accumulate() {
    let out = run_simulation(11, 1_000, 60);

    // Every lifetime is below 50, so all 100 carriers are gone by tick 60.
    assert_eq!(out.alive, 900);
    // Entities with i % 3 == 0 and i % 10 == 0 (i % 30 == 0) were destroyed.
    let scored_survivors = (0..1_000).filter(|i| i % 3 == 0 && i % 10 != 0).count() as i64;
    assert!(out.score_sum >= scored_survivors * 60);
}

#[test]
fn stable_queries_are_served_from_cache() {
    // Only entity 0 carries a lifetime, so at most one structural change
    // happens and nearly all 400 queries hit.
    let out = run_simulation(3, 9, 100);
    assert!(out.hits > 300, "expected mostly cache hits, got {}", out.hits);
}

// -- State stack --------------------------------------------------------------

struct Gameplay {
    position: ComponentType<Position>,
    velocity: ComponentType<Velocity>,
}

impl GameState for Gameplay {
    fn name(&self) -> &str {
        "gameplay"
    }

    fn enter(&mut self, world: &mut World) -> Result<(), EcsError> {
        world.spawn((
            self.position.instantiate(),
            self.velocity.wrap(Velocity { dx: 1.0, dy: 0.0 }),
        ))?;
        Ok(())
    }

    fn update(&mut self, world: &mut World) -> Result<(), EcsError> {
        for (_e, pos, vel) in world.query((&self.position, &self.velocity))?.iter() {
            pos.borrow_mut().x += vel.borrow().dx;
        }
        Ok(())
    }
}

struct Paused;

impl GameState for Paused {
    fn name(&self) -> &str {
        "paused"
    }

    fn update(&mut self, _world: &mut World) -> Result<(), EcsError> {
        Ok(())
    }
}

#[test]
fn pause_overlay_freezes_gameplay() {
    let mut world = World::new();
    let position = world.declare_component_type::<Position>("position");
    let velocity = world.declare_component_type::<Velocity>("velocity");

    let mut states = StateStack::new();
    states
        .change_state(
            &mut world,
            Box::new(Gameplay {
                position: position.clone(),
                velocity: velocity.clone(),
            }),
        )
        .unwrap();
    assert_eq!(world.entity_count(), 1);

    let x = |world: &mut World| world.query(&position).unwrap()[0].1.get().x;

    for _ in 0..5 {
        states.update(&mut world).unwrap();
    }
    assert_eq!(x(&mut world), 5.0);

    states.push_state(&mut world, Box::new(Paused)).unwrap();
    for _ in 0..5 {
        states.update(&mut world).unwrap();
    }
    assert_eq!(x(&mut world), 5.0);
    assert_eq!(states.current(), Some("paused"));

    states.pop_state(&mut world).unwrap();
    states.update(&mut world).unwrap();
    assert_eq!(x(&mut world), 6.0);
}

#[test]
fn failing_system_reports_its_name() {
    let mut world = World::new();
    let position = world.declare_component_type::<Position>("position");
    let e = world.spawn(position.instantiate()).unwrap();
    world.destroy(e).unwrap();

    let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
    let p = position.clone();
    tick_loop.add_system("revive", move |world| world.add_components(e, p.instantiate()));

    let err = tick_loop.tick().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("system 'revive' failed: {}", EcsError::DeadEntity { entity: e })
    );
    assert_eq!(tick_loop.tick_count(), 0);
}
