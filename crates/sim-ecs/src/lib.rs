//! Sim ECS -- a small entity component store with cached multi-type queries.
//!
//! Component types are declared at startup and get a permanent integer id.
//! Each type owns a map from [`Entity`](entity::Entity) to component. A query
//! intersects those maps, smallest first, and the result is memoized until a
//! structural change touches one of the queried types.
//!
//! Query rows hold live [`ComponentRef`](store::ComponentRef) handles, so
//! systems mutate components in place through them.
//!
//! # Quick Start
//!
//! ```
//! use sim_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::new();
//! let position = world.declare_component_type::<Position>("position");
//! let velocity = world.declare_component_type::<Velocity>("velocity");
//!
//! let entity = world
//!     .spawn((position.instantiate(), velocity.wrap(Velocity { dx: 1.0, dy: 0.5 })))
//!     .unwrap();
//!
//! for (_entity, pos, vel) in world.query((&position, &velocity)).unwrap().iter() {
//!     let vel = vel.borrow();
//!     let mut pos = pos.borrow_mut();
//!     pos.x += vel.dx;
//!     pos.y += vel.dy;
//! }
//!
//! assert_eq!(
//!     world.get_component(entity, &position).unwrap().get(),
//!     Position { x: 1.0, y: 0.5 }
//! );
//! ```

#![deny(unsafe_code)]

pub mod bundle;
pub mod cache;
pub mod component;
pub mod config;
pub mod entity;
pub mod query;
pub mod sort;
pub mod store;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity id was never handed out by this world.
    #[error("entity {entity} was never spawned by this world")]
    UnknownEntity { entity: entity::Entity },

    /// The entity was destroyed and can no longer receive components.
    #[error("entity {entity} has been destroyed")]
    DeadEntity { entity: entity::Entity },

    /// A component type id that was not declared on this world.
    #[error("component type {type_id:?} not declared ({declared} types declared)")]
    UnknownComponent {
        type_id: component::ComponentTypeId,
        declared: usize,
    },

    /// A payload whose Rust type does not match the declared type.
    #[error("payload for component type {type_id:?} is not a {expected}")]
    ComponentTypeMismatch {
        type_id: component::ComponentTypeId,
        expected: &'static str,
    },

    /// A matched entity had no component for one of the queried types.
    #[error("entity {entity} is missing a queried component")]
    MissingComponent { entity: entity::Entity },

    /// A query or intersection over zero component types.
    #[error("query must name at least one component type")]
    EmptyQuery,

    /// A configuration document could not be parsed.
    #[error("invalid world configuration: {details}")]
    InvalidConfig { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::bundle::{Bundle, ComponentBundle};
    pub use crate::cache::{CacheStats, QueryResult};
    pub use crate::component::{
        Component, ComponentInfo, ComponentInstance, ComponentRegistry, ComponentType,
        ComponentTypeId,
    };
    pub use crate::config::WorldConfig;
    pub use crate::entity::Entity;
    pub use crate::query::ComponentSet;
    pub use crate::store::{ComponentRef, ComponentStore};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct MaxVelocity {
        dx: f32,
        dy: f32,
    }

    struct Types {
        position: ComponentType<Position>,
        velocity: ComponentType<Velocity>,
        max_velocity: ComponentType<MaxVelocity>,
    }

    fn setup_world() -> (World, Types) {
        let mut world = World::new();
        let types = Types {
            position: world.declare_component_type("position"),
            velocity: world.declare_component_type("velocity"),
            max_velocity: world
                .declare_component_type_with("max_velocity", MaxVelocity { dx: 3.0, dy: 3.0 }),
        };
        (world, types)
    }

    // -- spawn / destroy ----------------------------------------------------

    #[test]
    fn spawn_entities_with_components_and_query_back() {
        let (mut world, t) = setup_world();

        let e = world
            .spawn((
                t.position.wrap(Position { x: 1.0, y: 2.0 }),
                t.velocity.wrap(Velocity { dx: 3.0, dy: 4.0 }),
            ))
            .unwrap();

        assert_eq!(
            world.get_component(e, &t.position).unwrap().get(),
            Position { x: 1.0, y: 2.0 }
        );
        assert_eq!(
            world.get_component(e, &t.velocity).unwrap().get(),
            Velocity { dx: 3.0, dy: 4.0 }
        );
    }

    #[test]
    fn destroy_entity_verify_gone() {
        let (mut world, t) = setup_world();
        let e = world.spawn(t.position.instantiate()).unwrap();
        world.query(&t.position).unwrap();

        world.destroy(e).unwrap();

        assert!(!world.is_alive(e));
        assert!(world.get_component(e, &t.position).is_none());
        assert!(world.query(&t.position).unwrap().is_empty());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_destroy() {
        let (mut world, t) = setup_world();
        let e0 = world.spawn(t.position.instantiate()).unwrap();
        world.destroy(e0).unwrap();
        let e1 = world.spawn(t.position.instantiate()).unwrap();
        assert!(e1 > e0);
        assert!(world.get_component(e0, &t.position).is_none());
    }

    // -- instantiation ------------------------------------------------------

    #[test]
    fn template_instances_are_not_aliased() {
        let (mut world, t) = setup_world();
        let a = world.spawn(t.max_velocity.instantiate()).unwrap();
        let b = world.spawn(t.max_velocity.instantiate()).unwrap();

        world.get_component(a, &t.max_velocity).unwrap().borrow_mut().dx = 10.0;

        assert_eq!(world.get_component(b, &t.max_velocity).unwrap().get().dx, 3.0);
        assert_eq!(t.max_velocity.template().dx, 3.0);
    }

    #[test]
    fn dynamic_bundle_spawn() {
        let (mut world, t) = setup_world();
        let mut bundle = ComponentBundle::new();
        bundle
            .add(t.position.instantiate_with(|p| p.x = 5.0))
            .add_default(&t.max_velocity);
        let e = world.spawn(bundle).unwrap();

        assert_eq!(world.get_component(e, &t.position).unwrap().get().x, 5.0);
        assert!(world.get_component(e, &t.max_velocity).is_some());
        assert!(world.get_component(e, &t.velocity).is_none());
    }

    // -- systems over live query results ------------------------------------

    /// Mirrors an "apply velocity" system: integrate, then damp any entity
    /// over its speed limit.
    fn apply_velocity(world: &mut World, t: &Types) {
        let rows = world.query((&t.position, &t.velocity)).unwrap();
        for (e, pos, vel) in rows.iter() {
            let mut vel = vel.borrow_mut();
            {
                let mut pos = pos.borrow_mut();
                pos.x += vel.dx;
                pos.y += vel.dy;
            }
            if let Some(max) = world.get_component(*e, &t.max_velocity) {
                let max = max.borrow();
                if vel.dx.abs() > max.dx {
                    vel.dx *= 0.5;
                }
            }
        }
    }

    #[test]
    fn system_mutates_components_through_query() {
        let (mut world, t) = setup_world();
        let fast = world
            .spawn((
                t.position.instantiate(),
                t.velocity.wrap(Velocity { dx: 8.0, dy: 0.0 }),
                t.max_velocity.instantiate(),
            ))
            .unwrap();
        let slow = world
            .spawn((t.position.instantiate(), t.velocity.wrap(Velocity { dx: 1.0, dy: 1.0 })))
            .unwrap();

        apply_velocity(&mut world, &t);
        apply_velocity(&mut world, &t);

        assert_eq!(world.get_component(fast, &t.position).unwrap().get().x, 12.0);
        assert_eq!(world.get_component(fast, &t.velocity).unwrap().get().dx, 2.0);
        assert_eq!(
            world.get_component(slow, &t.position).unwrap().get(),
            Position { x: 2.0, y: 2.0 }
        );
        // The second tick was served from the cache.
        assert_eq!(world.cache_stats().hits, 1);
    }

    // -- scale test ---------------------------------------------------------

    #[test]
    fn scale_10k_entities() {
        let (mut world, t) = setup_world();

        let mut entities = Vec::with_capacity(10_000);
        for i in 0..10_000u32 {
            let e = world
                .spawn((
                    t.position.wrap(Position {
                        x: i as f32,
                        y: i as f32 * 2.0,
                    }),
                    t.velocity.wrap(Velocity { dx: 1.0, dy: -1.0 }),
                ))
                .unwrap();
            entities.push(e);
        }

        assert_eq!(world.query((&t.position, &t.velocity)).unwrap().len(), 10_000);

        for (_e, vel) in world.query(&t.velocity).unwrap().iter() {
            let mut vel = vel.borrow_mut();
            vel.dx *= 2.0;
            vel.dy *= 2.0;
        }
        let vel = world.get_component(entities[0], &t.velocity).unwrap().get();
        assert_eq!(vel, Velocity { dx: 2.0, dy: -2.0 });

        for e in entities.iter().take(5_000) {
            world.destroy(*e).unwrap();
        }

        let rows = world.query((&t.position, &t.velocity)).unwrap();
        assert_eq!(rows.len(), 5_000);
        assert_eq!(rows[0].0, entities[5_000]);
        assert_eq!(world.entity_count(), 5_000);
    }

    // -- errors -------------------------------------------------------------

    #[test]
    fn error_messages() {
        let err = EcsError::UnknownEntity {
            entity: Entity::from_raw(9),
        };
        assert_eq!(err.to_string(), "entity e9 was never spawned by this world");
        assert_eq!(
            EcsError::EmptyQuery.to_string(),
            "query must name at least one component type"
        );
    }
}
