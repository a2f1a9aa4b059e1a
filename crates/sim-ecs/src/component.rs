//! Component type declaration and metadata.
//!
//! Every component kind is declared once on a [`World`](crate::world::World),
//! which hands back a [`ComponentType`] factory. The factory carries the
//! permanent [`ComponentTypeId`] and the default template new instances are
//! cloned from.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a declared component type.
///
/// Ids are dense and assigned from 0 in declaration order. They double as the
/// index of the type's store inside the world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// Raw index of this type id.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker for types that can be stored as components.
///
/// `Clone` is the structural copy used to stamp new instances out of a
/// template, so every instance is an independent value.
pub trait Component: Clone + 'static {}

impl<T: Clone + 'static> Component for T {}

// ---------------------------------------------------------------------------
// ComponentInstance
// ---------------------------------------------------------------------------

/// A component payload tagged with the id of the type it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance<T> {
    type_id: ComponentTypeId,
    value: T,
}

impl<T> ComponentInstance<T> {
    /// The type id this payload will be stored under.
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    /// Borrow the payload.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the payload out.
    pub fn into_value(self) -> T {
        self.value
    }

    pub(crate) fn into_parts(self) -> (ComponentTypeId, T) {
        (self.type_id, self.value)
    }
}

// ---------------------------------------------------------------------------
// ComponentType
// ---------------------------------------------------------------------------

/// Factory for instances of one declared component type.
///
/// Immutable once created. Cloning a factory is cheap and every clone refers
/// to the same type id and template.
pub struct ComponentType<T> {
    id: ComponentTypeId,
    name: Rc<str>,
    template: Rc<T>,
}

impl<T: Component> ComponentType<T> {
    pub(crate) fn new(id: ComponentTypeId, name: &str, template: T) -> Self {
        Self {
            id,
            name: Rc::from(name),
            template: Rc::new(template),
        }
    }

    /// The permanent id of this type.
    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// The name the type was declared under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template new instances are cloned from.
    pub fn template(&self) -> &T {
        &self.template
    }

    /// A fresh copy of the template.
    pub fn instantiate(&self) -> ComponentInstance<T> {
        self.wrap(T::clone(&self.template))
    }

    /// A fresh copy of the template with `overrides` applied on top.
    ///
    /// ```
    /// # use sim_ecs::prelude::*;
    /// #[derive(Debug, Clone, Default, PartialEq)]
    /// struct Position { x: f32, y: f32 }
    ///
    /// let mut world = World::new();
    /// let position = world.declare_component_type::<Position>("position");
    /// let p = position.instantiate_with(|p| p.x = 3.0);
    /// assert_eq!(p.value(), &Position { x: 3.0, y: 0.0 });
    /// ```
    pub fn instantiate_with<F>(&self, overrides: F) -> ComponentInstance<T>
    where
        F: FnOnce(&mut T),
    {
        let mut value = T::clone(&self.template);
        overrides(&mut value);
        self.wrap(value)
    }

    /// Tag an already complete payload with this type's id.
    pub fn wrap(&self, value: T) -> ComponentInstance<T> {
        ComponentInstance {
            type_id: self.id,
            value,
        }
    }
}

impl<T> Clone for ComponentType<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Rc::clone(&self.name),
            template: Rc::clone(&self.template),
        }
    }
}

impl<T> fmt::Debug for ComponentType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a declared component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Id assigned at declaration time.
    pub id: ComponentTypeId,
    /// Name supplied by the caller.
    pub name: String,
    /// `std::any::type_name::<T>()`
    pub type_name: &'static str,
    /// Rust `TypeId` of the payload.
    pub type_id: TypeId,
    /// Whether the caller supplied a template instead of `T::default()`.
    pub explicit_template: bool,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry of every declared component type, indexed by [`ComponentTypeId`].
///
/// Unlike Rust types, component types are identified by declaration: the same
/// payload type may be declared several times under different names and each
/// declaration gets its own id.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Name -> ComponentTypeId.
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by ComponentTypeId.0.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id for a payload type `T` declared as `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already declared.
    pub fn declare<T: 'static>(&mut self, name: &str, explicit_template: bool) -> ComponentTypeId {
        assert!(
            !self.by_name.contains_key(name),
            "component name '{name}' is already declared"
        );

        let id = ComponentTypeId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            explicit_template,
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Look up a component type by its declared name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the [`ComponentInfo`] for a declared type id.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Whether `id` was issued by this registry.
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        id.index() < self.infos.len()
    }

    /// Total number of declared component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no component types have been declared.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Names of all declared component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
