//! The [`World`] is the top-level container for the ECS. It owns the entity
//! allocator, the component registry, one store per declared component type,
//! and the query cache.

use std::any::{Any, TypeId};
use std::rc::Rc;

use tracing::debug;

use crate::bundle::{Bundle, BundlePart};
use crate::cache::{CacheStats, QueryCache, QueryResult};
use crate::component::{Component, ComponentRegistry, ComponentType, ComponentTypeId};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityAllocator};
use crate::query::ComponentSet;
use crate::sort::intersect_all;
use crate::store::{AnyStore, ComponentRef, ComponentStore};
use crate::EcsError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The top-level ECS container.
///
/// Provides the whole public surface: component type declaration, entity
/// lifecycle, component access and cached queries. A world is meant to be
/// constructed once and passed explicitly to the systems that use it.
pub struct World {
    /// Configuration the world was created with.
    config: WorldConfig,
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Component type registry.
    registry: ComponentRegistry,
    /// One store per declared type, indexed by `ComponentTypeId.0`.
    stores: Vec<Box<dyn AnyStore>>,
    /// Memoized query results.
    cache: QueryCache,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.allocator.alive_count())
            .field("component_types", &self.stores.len())
            .field("cached_queries", &self.cache.len())
            .finish()
    }
}

impl World {
    /// Create a new, empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a new, empty world.
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            cache: QueryCache::new(config.query_cache),
            config,
            allocator: EntityAllocator::new(),
            registry: ComponentRegistry::new(),
            stores: Vec::new(),
        }
    }

    /// The configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- component type declaration -----------------------------------------

    /// Declare a component type whose instances start as `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already declared.
    pub fn declare_component_type<T>(&mut self, name: &str) -> ComponentType<T>
    where
        T: Component + Default,
    {
        self.declare(name, T::default(), false)
    }

    /// Declare a component type whose instances are cloned from `template`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already declared.
    pub fn declare_component_type_with<T: Component>(
        &mut self,
        name: &str,
        template: T,
    ) -> ComponentType<T> {
        self.declare(name, template, true)
    }

    fn declare<T: Component>(&mut self, name: &str, template: T, explicit: bool) -> ComponentType<T> {
        let id = self.registry.declare::<T>(name, explicit);
        debug_assert_eq!(id.index(), self.stores.len());
        self.stores
            .push(Box::new(ComponentStore::<T>::with_capacity(self.config.store_capacity)));
        debug!(
            type_id = ?id,
            component = name,
            type_name = std::any::type_name::<T>(),
            "component type declared"
        );
        ComponentType::new(id, name, template)
    }

    /// Typed access to the store behind `factory`.
    ///
    /// Returns `None` if the factory was not issued by this world.
    pub fn store<T: Component>(&self, factory: &ComponentType<T>) -> Option<&ComponentStore<T>> {
        self.stores
            .get(factory.id().index())?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
    }

    /// Check that `factory` names a type declared on this world with payload
    /// type `T`.
    pub fn check_factory<T: Component>(&self, factory: &ComponentType<T>) -> Result<(), EcsError> {
        self.check_payload(factory.id(), TypeId::of::<T>())
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Spawn a new entity carrying every component in `bundle`.
    ///
    /// The bundle is validated before the entity id is allocated, so a
    /// failing spawn leaves the world untouched.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Result<Entity, EcsError> {
        let parts = bundle.into_parts();
        self.validate_parts(&parts)?;

        let entity = self.allocator.allocate();
        let type_ids = self.insert_parts(entity, parts)?;
        self.cache.invalidate(&type_ids);

        debug!(entity = %entity, components = type_ids.len(), "entity spawned");
        Ok(entity)
    }

    /// Remove `entity` from every store and purge the whole query cache.
    ///
    /// Destroying an already destroyed entity is a no-op. Ids are never
    /// reused, so a destroyed entity stays dead.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_issued(entity)?;

        let mut removed = 0usize;
        for store in &mut self.stores {
            if store.remove_entity(entity) {
                removed += 1;
            }
        }
        let was_alive = self.allocator.deallocate(entity);
        // Purge everything, not only the types the entity carried.
        self.cache.clear();

        if was_alive {
            debug!(entity = %entity, components = removed, "entity destroyed");
        }
        Ok(())
    }

    /// Insert or overwrite every component in `bundle` on `entity`.
    ///
    /// Overwrites happen in place: handles already obtained for the
    /// `(entity, type)` pair observe the new value.
    ///
    /// # Panics
    ///
    /// Panics if a component being overwritten is currently borrowed through
    /// a [`ComponentRef`], e.g. a `borrow()` taken from a query row that is
    /// still alive.
    pub fn add_components<B: Bundle>(&mut self, entity: Entity, bundle: B) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        let parts = bundle.into_parts();
        self.validate_parts(&parts)?;

        let type_ids = self.insert_parts(entity, parts)?;
        self.cache.invalidate(&type_ids);
        Ok(())
    }

    /// Remove every component type named by `set` from `entity`.
    ///
    /// Types the entity does not have are skipped. Removing from a destroyed
    /// entity is a no-op.
    pub fn remove_components<S: ComponentSet>(&mut self, entity: Entity, set: S) -> Result<(), EcsError> {
        self.check_issued(entity)?;
        set.check(self)?;
        let type_ids = set.type_ids();

        for &type_id in &type_ids {
            self.stores[type_id.index()].remove_entity(entity);
        }
        self.cache.invalidate(&type_ids);
        Ok(())
    }

    /// Remove a single component type from `entity`.
    pub fn remove_component<T: Component>(
        &mut self,
        entity: Entity,
        factory: &ComponentType<T>,
    ) -> Result<(), EcsError> {
        self.remove_components(entity, factory)
    }

    // -- component access ---------------------------------------------------

    /// Live handle to `entity`'s component of type `factory`, if it has one.
    pub fn get_component<T: Component>(
        &self,
        entity: Entity,
        factory: &ComponentType<T>,
    ) -> Option<ComponentRef<T>> {
        self.store(factory)?.get(entity).cloned()
    }

    /// Independent lookups for every factory in `set`, in order.
    ///
    /// ```
    /// # use sim_ecs::prelude::*;
    /// # #[derive(Debug, Clone, Default)] struct Paddle;
    /// # #[derive(Debug, Clone, Default)] struct Size { w: f32 }
    /// let mut world = World::new();
    /// let paddle = world.declare_component_type::<Paddle>("paddle");
    /// let size = world.declare_component_type::<Size>("size");
    /// let e = world.spawn(size.instantiate()).unwrap();
    ///
    /// let (p, s) = world.get_components(e, (&paddle, &size));
    /// assert!(p.is_none());
    /// assert!(s.is_some());
    /// ```
    pub fn get_components<S: ComponentSet>(&self, entity: Entity, set: S) -> S::Fetched {
        set.fetch(self, entity)
    }

    /// Whether `entity` currently has a component of type `factory`.
    pub fn has_component<T: Component>(&self, entity: Entity, factory: &ComponentType<T>) -> bool {
        self.store(factory).is_some_and(|store| store.contains(entity))
    }

    // -- queries ------------------------------------------------------------

    /// Every entity carrying all types in `set`, with live handles to its
    /// components in the listed order. Rows are sorted by ascending entity.
    ///
    /// Results are cached under the listed type order until a structural
    /// change touches one of the types. A cache hit returns the same `Rc`.
    ///
    /// Every factory is checked against the world first, so a foreign or
    /// mismatched factory is an error rather than an empty result.
    pub fn query<S: ComponentSet>(&mut self, set: S) -> Result<QueryResult<S::Row>, EcsError> {
        set.check(self)?;
        let key = set.type_ids();
        if let Some(rows) = self.cache.get::<S::Row>(&key) {
            return Ok(rows);
        }

        let entities = self.get_entities(&key)?;
        let rows = entities
            .into_iter()
            .map(|entity| {
                set.fetch_row(self, entity)
                    .ok_or(EcsError::MissingComponent { entity })
            })
            .collect::<Result<Vec<S::Row>, EcsError>>()?;
        let rows = Rc::new(rows);
        self.cache.insert(key, Rc::clone(&rows));
        Ok(rows)
    }

    /// Ascending list of the entities present in every store named by
    /// `type_ids`. Never cached.
    pub fn get_entities(&self, type_ids: &[ComponentTypeId]) -> Result<Vec<Entity>, EcsError> {
        if type_ids.is_empty() {
            return Err(EcsError::EmptyQuery);
        }
        let mut sets = Vec::with_capacity(type_ids.len());
        for &type_id in type_ids {
            self.check_type(type_id)?;
            sets.push(self.stores[type_id.index()].entity_keys());
        }
        Ok(intersect_all(sets))
    }

    // -- introspection ------------------------------------------------------

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Whether `entity` was spawned by this world and not yet destroyed.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of declared component types.
    pub fn component_type_count(&self) -> usize {
        self.stores.len()
    }

    /// Number of components stored under `type_id`.
    pub fn store_len(&self, type_id: ComponentTypeId) -> Option<usize> {
        self.stores.get(type_id.index()).map(|s| s.count())
    }

    /// Query cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Zero the query cache counters.
    pub fn reset_cache_stats(&mut self) {
        self.cache.reset_stats();
    }

    /// Number of query results currently cached.
    pub fn cached_query_count(&self) -> usize {
        self.cache.len()
    }

    /// Whether a result is cached for exactly this type id sequence.
    pub fn is_query_cached(&self, type_ids: &[ComponentTypeId]) -> bool {
        self.cache.contains(type_ids)
    }

    // -- internals ----------------------------------------------------------

    fn check_issued(&self, entity: Entity) -> Result<(), EcsError> {
        if self.allocator.was_issued(entity) {
            Ok(())
        } else {
            Err(EcsError::UnknownEntity { entity })
        }
    }

    fn check_alive(&self, entity: Entity) -> Result<(), EcsError> {
        self.check_issued(entity)?;
        if self.allocator.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::DeadEntity { entity })
        }
    }

    fn check_type(&self, type_id: ComponentTypeId) -> Result<(), EcsError> {
        if self.registry.contains(type_id) {
            Ok(())
        } else {
            Err(EcsError::UnknownComponent {
                type_id,
                declared: self.registry.len(),
            })
        }
    }

    /// `type_id` must be declared, and declared with payload type `payload`.
    fn check_payload(&self, type_id: ComponentTypeId, payload: TypeId) -> Result<(), EcsError> {
        let info = self
            .registry
            .get_info(type_id)
            .ok_or(EcsError::UnknownComponent {
                type_id,
                declared: self.registry.len(),
            })?;
        if info.type_id == payload {
            Ok(())
        } else {
            Err(EcsError::ComponentTypeMismatch {
                type_id,
                expected: info.type_name,
            })
        }
    }

    /// Make sure every part targets a declared type with a matching payload.
    fn validate_parts(&self, parts: &[BundlePart]) -> Result<(), EcsError> {
        for part in parts {
            self.check_payload(part.type_id, Any::type_id(&*part.value))?;
        }
        Ok(())
    }

    /// Store every part for `entity`, returning the touched type ids.
    fn insert_parts(
        &mut self,
        entity: Entity,
        parts: Vec<BundlePart>,
    ) -> Result<Vec<ComponentTypeId>, EcsError> {
        let mut type_ids = Vec::with_capacity(parts.len());
        for part in parts {
            let type_id = part.type_id;
            self.stores[type_id.index()]
                .insert_boxed(entity, part.value)
                .map_err(|_| EcsError::ComponentTypeMismatch {
                    type_id,
                    expected: self
                        .registry
                        .get_info(type_id)
                        .map_or("<unknown>", |info| info.type_name),
                })?;
            if !type_ids.contains(&type_id) {
                type_ids.push(type_id);
            }
        }
        Ok(type_ids)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
