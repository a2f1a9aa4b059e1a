//! Per-type component storage.
//!
//! Each declared component type owns one [`ComponentStore`], a map from
//! [`Entity`] to a shared [`ComponentRef`] handle. Handles are what lookups and
//! query results hand out, so writes through any of them land in the store.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::entity::Entity;

// ---------------------------------------------------------------------------
// ComponentRef
// ---------------------------------------------------------------------------

/// Live handle to one stored component.
///
/// Cloning the handle does not clone the component. The world is
/// single-threaded, so the handle uses `Rc<RefCell<_>>` and the usual
/// `RefCell` borrow rules apply at runtime.
pub struct ComponentRef<T>(Rc<RefCell<T>>);

impl<T> ComponentRef<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrow the component.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrow the component.
    ///
    /// # Panics
    ///
    /// Panics if the component is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Replace the stored value, returning the old one.
    pub fn set(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Whether two handles point at the same stored component.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> ComponentRef<T> {
    /// Copy the current value out.
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

impl<T> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => f.debug_tuple("ComponentRef").field(&*value).finish(),
            Err(_) => f.write_str("ComponentRef(<borrowed>)"),
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Map from entity to component for a single component type.
pub struct ComponentStore<T> {
    data: HashMap<Entity, ComponentRef<T>>,
}

impl<T: 'static> ComponentStore<T> {
    /// Create an empty store with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: HashMap::with_capacity(capacity),
        }
    }

    /// Insert `value` for `entity`.
    ///
    /// An existing component is overwritten in place, so handles already
    /// given out for it observe the new value. Returns `true` in that case.
    ///
    /// # Panics
    ///
    /// Panics if the existing component is currently borrowed.
    pub fn insert(&mut self, entity: Entity, value: T) -> bool {
        match self.data.get(&entity) {
            Some(slot) => {
                slot.set(value);
                true
            }
            None => {
                self.data.insert(entity, ComponentRef::new(value));
                false
            }
        }
    }

    /// Remove the component for `entity`, returning its handle if present.
    pub fn remove(&mut self, entity: Entity) -> Option<ComponentRef<T>> {
        self.data.remove(&entity)
    }

    /// Handle to the component for `entity`.
    pub fn get(&self, entity: Entity) -> Option<&ComponentRef<T>> {
        self.data.get(&entity)
    }

    /// Whether `entity` has a component in this store.
    pub fn contains(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    /// Every entity with a component in this store, in no particular order.
    pub fn entities(&self) -> Vec<Entity> {
        self.data.keys().copied().collect()
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStore")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.data.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AnyStore -- type-erased store access for the world
// ---------------------------------------------------------------------------

/// Object-safe view of a [`ComponentStore`] used where the payload type is
/// not known statically (destroy, intersection, bundle insertion).
pub(crate) trait AnyStore: fmt::Debug {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains_entity(&self, entity: Entity) -> bool;
    fn entity_keys(&self) -> Vec<Entity>;
    fn count(&self) -> usize;
    /// Insert a boxed payload. Hands the box back if it is not a `T`.
    fn insert_boxed(&mut self, entity: Entity, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn entity_keys(&self) -> Vec<Entity> {
        self.entities()
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn insert_boxed(&mut self, entity: Entity, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let value = value.downcast::<T>()?;
        self.insert(entity, *value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    #[test]
    fn overwrite_is_visible_through_old_handle() {
        let mut store = ComponentStore::with_capacity(4);
        let e = Entity::from_raw(0);
        assert!(!store.insert(e, Health(10)));
        let handle = store.get(e).unwrap().clone();

        assert!(store.insert(e, Health(3)));
        assert_eq!(handle.get(), Health(3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mutation_through_handle_reaches_store() {
        let mut store = ComponentStore::with_capacity(0);
        let e = Entity::from_raw(5);
        store.insert(e, Health(1));

        let handle = store.get(e).unwrap().clone();
        handle.borrow_mut().0 += 41;

        assert_eq!(*store.get(e).unwrap().borrow(), Health(42));
    }

    #[test]
    fn remove_and_contains() {
        let mut store = ComponentStore::with_capacity(0);
        let e = Entity::from_raw(1);
        store.insert(e, Health(1));
        assert!(store.contains(e));
        assert!(store.remove(e).is_some());
        assert!(!store.contains(e));
        assert!(store.remove(e).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn boxed_insert_rejects_wrong_type() {
        let mut store: ComponentStore<Health> = ComponentStore::with_capacity(0);
        let e = Entity::from_raw(0);
        assert!(store.insert_boxed(e, Box::new(7u8)).is_err());
        assert!(store.insert_boxed(e, Box::new(Health(7))).is_ok());
        assert_eq!(store.get(e).unwrap().get(), Health(7));
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = ComponentRef::new(Health(1));
        let b = a.clone();
        let c = ComponentRef::new(Health(1));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
