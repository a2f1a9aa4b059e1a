//! Typed component sets for lookups and queries.
//!
//! A [`ComponentSet`] is a factory or a tuple of factories such as
//! `(&position, &velocity)`. It names the type ids a query intersects over and
//! knows how to pull each entity's components out of the world as live
//! [`ComponentRef`] handles, in the order the factories were listed.
//!
//! There is no implementation for the empty tuple: a query over zero
//! component types does not compile.

use crate::component::{Component, ComponentType, ComponentTypeId};
use crate::entity::Entity;
use crate::EcsError;
use crate::store::ComponentRef;
use crate::world::World;

// ---------------------------------------------------------------------------
// ComponentSet trait
// ---------------------------------------------------------------------------

/// A non-empty, ordered set of component factories.
pub trait ComponentSet {
    /// Per-factory optional handles, e.g. `(Option<ComponentRef<A>>, Option<ComponentRef<B>>)`.
    type Fetched;
    /// One query result row, e.g. `(Entity, ComponentRef<A>, ComponentRef<B>)`.
    type Row: 'static;

    /// The requested type ids, in order.
    fn type_ids(&self) -> Vec<ComponentTypeId>;

    /// Fail unless every factory was declared on `world` with its payload type.
    fn check(&self, world: &World) -> Result<(), EcsError>;

    /// Independent lookups for every factory.
    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched;

    /// A full row, or `None` if any component is missing.
    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row>;
}

impl<A: Component> ComponentSet for &ComponentType<A> {
    type Fetched = Option<ComponentRef<A>>;
    type Row = (Entity, ComponentRef<A>);

    fn type_ids(&self) -> Vec<ComponentTypeId> {
        vec![self.id()]
    }

    fn check(&self, world: &World) -> Result<(), EcsError> {
        world.check_factory(self)
    }

    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched {
        world.get_component(entity, self)
    }

    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row> {
        Some((entity, world.get_component(entity, self)?))
    }
}

impl<A: Component> ComponentSet for (&ComponentType<A>,) {
    type Fetched = (Option<ComponentRef<A>>,);
    type Row = (Entity, ComponentRef<A>);

    fn type_ids(&self) -> Vec<ComponentTypeId> {
        vec![self.0.id()]
    }

    fn check(&self, world: &World) -> Result<(), EcsError> {
        world.check_factory(self.0)
    }

    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched {
        (world.get_component(entity, self.0),)
    }

    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row> {
        Some((entity, world.get_component(entity, self.0)?))
    }
}

impl<A: Component, B: Component> ComponentSet for (&ComponentType<A>, &ComponentType<B>) {
    type Fetched = (Option<ComponentRef<A>>, Option<ComponentRef<B>>);
    type Row = (Entity, ComponentRef<A>, ComponentRef<B>);

    fn type_ids(&self) -> Vec<ComponentTypeId> {
        vec![self.0.id(), self.1.id()]
    }

    fn check(&self, world: &World) -> Result<(), EcsError> {
        world.check_factory(self.0)?;
        world.check_factory(self.1)
    }

    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched {
        (
            world.get_component(entity, self.0),
            world.get_component(entity, self.1),
        )
    }

    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row> {
        Some((
            entity,
            world.get_component(entity, self.0)?,
            world.get_component(entity, self.1)?,
        ))
    }
}

impl<A: Component, B: Component, C: Component> ComponentSet
    for (&ComponentType<A>, &ComponentType<B>, &ComponentType<C>)
{
    type Fetched = (
        Option<ComponentRef<A>>,
        Option<ComponentRef<B>>,
        Option<ComponentRef<C>>,
    );
    type Row = (Entity, ComponentRef<A>, ComponentRef<B>, ComponentRef<C>);

    fn type_ids(&self) -> Vec<ComponentTypeId> {
        vec![self.0.id(), self.1.id(), self.2.id()]
    }

    fn check(&self, world: &World) -> Result<(), EcsError> {
        world.check_factory(self.0)?;
        world.check_factory(self.1)?;
        world.check_factory(self.2)
    }

    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched {
        (
            world.get_component(entity, self.0),
            world.get_component(entity, self.1),
            world.get_component(entity, self.2),
        )
    }

    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row> {
        Some((
            entity,
            world.get_component(entity, self.0)?,
            world.get_component(entity, self.1)?,
            world.get_component(entity, self.2)?,
        ))
    }
}

impl<A: Component, B: Component, C: Component, D: Component> ComponentSet
    for (
        &ComponentType<A>,
        &ComponentType<B>,
        &ComponentType<C>,
        &ComponentType<D>,
    )
{
    type Fetched = (
        Option<ComponentRef<A>>,
        Option<ComponentRef<B>>,
        Option<ComponentRef<C>>,
        Option<ComponentRef<D>>,
    );
    type Row = (
        Entity,
        ComponentRef<A>,
        ComponentRef<B>,
        ComponentRef<C>,
        ComponentRef<D>,
    );

    fn type_ids(&self) -> Vec<ComponentTypeId> {
        vec![self.0.id(), self.1.id(), self.2.id(), self.3.id()]
    }

    fn check(&self, world: &World) -> Result<(), EcsError> {
        world.check_factory(self.0)?;
        world.check_factory(self.1)?;
        world.check_factory(self.2)?;
        world.check_factory(self.3)
    }

    fn fetch(&self, world: &World, entity: Entity) -> Self::Fetched {
        (
            world.get_component(entity, self.0),
            world.get_component(entity, self.1),
            world.get_component(entity, self.2),
            world.get_component(entity, self.3),
        )
    }

    fn fetch_row(&self, world: &World, entity: Entity) -> Option<Self::Row> {
        Some((
            entity,
            world.get_component(entity, self.0)?,
            world.get_component(entity, self.1)?,
            world.get_component(entity, self.2)?,
            world.get_component(entity, self.3)?,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
