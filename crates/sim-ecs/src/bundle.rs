//! Groups of component instances inserted together.
//!
//! [`World::spawn`](crate::world::World::spawn) and
//! [`World::add_components`](crate::world::World::add_components) accept any
//! [`Bundle`]: a single [`ComponentInstance`], a bare factory (which is
//! instantiated from its template), a tuple of bundles, or a dynamically built
//! [`ComponentBundle`].

use std::any::Any;
use std::fmt;

use crate::component::{Component, ComponentInstance, ComponentType, ComponentTypeId};

// ---------------------------------------------------------------------------
// BundlePart
// ---------------------------------------------------------------------------

/// One type-erased component payload waiting to be stored.
pub struct BundlePart {
    pub(crate) type_id: ComponentTypeId,
    pub(crate) value: Box<dyn Any>,
}

impl BundlePart {
    fn from_instance<T: Component>(instance: ComponentInstance<T>) -> Self {
        let (type_id, value) = instance.into_parts();
        Self {
            type_id,
            value: Box::new(value),
        }
    }

    /// The type id the payload is stored under.
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }
}

impl fmt::Debug for BundlePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundlePart")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Anything that can be split into component payloads.
pub trait Bundle {
    /// Append this bundle's payloads to `out`, in order.
    fn write_parts(self, out: &mut Vec<BundlePart>);

    /// Collect the payloads into a fresh vector.
    fn into_parts(self) -> Vec<BundlePart>
    where
        Self: Sized,
    {
        let mut parts = Vec::new();
        self.write_parts(&mut parts);
        parts
    }
}

impl Bundle for () {
    fn write_parts(self, _out: &mut Vec<BundlePart>) {}
}

impl<T: Component> Bundle for ComponentInstance<T> {
    fn write_parts(self, out: &mut Vec<BundlePart>) {
        out.push(BundlePart::from_instance(self));
    }
}

/// A bare factory contributes a fresh copy of its template.
impl<T: Component> Bundle for &ComponentType<T> {
    fn write_parts(self, out: &mut Vec<BundlePart>) {
        out.push(BundlePart::from_instance(self.instantiate()));
    }
}

macro_rules! impl_bundle_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Bundle),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn write_parts(self, out: &mut Vec<BundlePart>) {
                let ($($name,)+) = self;
                $($name.write_parts(out);)+
            }
        }
    };
}

impl_bundle_for_tuple!(A);
impl_bundle_for_tuple!(A, B);
impl_bundle_for_tuple!(A, B, C);
impl_bundle_for_tuple!(A, B, C, D);
impl_bundle_for_tuple!(A, B, C, D, E);
impl_bundle_for_tuple!(A, B, C, D, E, F);
impl_bundle_for_tuple!(A, B, C, D, E, F, G);
impl_bundle_for_tuple!(A, B, C, D, E, F, G, H);

// ---------------------------------------------------------------------------
// ComponentBundle
// ---------------------------------------------------------------------------

/// A bundle assembled at runtime.
///
/// Adding the same component type twice is allowed; the later payload wins
/// once the bundle is applied.
#[derive(Debug, Default)]
pub struct ComponentBundle {
    parts: Vec<BundlePart>,
}

impl ComponentBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component instance.
    pub fn add<T: Component>(&mut self, instance: ComponentInstance<T>) -> &mut Self {
        self.parts.push(BundlePart::from_instance(instance));
        self
    }

    /// Add a fresh copy of `factory`'s template.
    pub fn add_default<T: Component>(&mut self, factory: &ComponentType<T>) -> &mut Self {
        self.add(factory.instantiate())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with<T: Component>(mut self, instance: ComponentInstance<T>) -> Self {
        self.add(instance);
        self
    }

    /// Type ids of the payloads, in insertion order (duplicates kept).
    pub fn type_ids(&self) -> Vec<ComponentTypeId> {
        self.parts.iter().map(|p| p.type_id).collect()
    }

    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the bundle carries no payloads.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Bundle for ComponentBundle {
    fn write_parts(self, out: &mut Vec<BundlePart>) {
        out.extend(self.parts);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
