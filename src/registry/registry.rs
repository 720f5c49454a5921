use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;

use crate::error::ConfigError;
use crate::hash::{HashMap, TypeIdMap, TypeIdSet};
use crate::id::IdResolverFactory;
use crate::key::TypeKey;
use crate::resolver::CustomTagResolver;

use super::metadata::PolyMeta;
use super::subtypes::{NamedSubtype, SubtypeSet};

// -----------------------------------------------------------------------------
// ContextKey

/// Identifies one declaring context: a bare type, or a property of a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextKey {
    type_id: TypeId,
    property: Option<&'static str>,
}

impl ContextKey {
    /// The context of a bare type.
    pub fn of_type(key: TypeKey) -> Self {
        Self {
            type_id: key.id(),
            property: None,
        }
    }

    /// The context of a property declared on `owner`.
    pub fn of_property(owner: TypeKey, property: &'static str) -> Self {
        Self {
            type_id: owner.id(),
            property: Some(property),
        }
    }
}

// -----------------------------------------------------------------------------
// PolyRegistry

#[derive(Default)]
pub(crate) struct ContextEntry {
    pub(crate) meta: Option<PolyMeta>,
    pub(crate) no_type_info: bool,
    pub(crate) custom_builder: Option<Arc<dyn CustomTagResolver>>,
    pub(crate) custom_id_resolver: Option<Arc<dyn IdResolverFactory>>,
}

/// The declared polymorphism configuration of a program, populated once
/// at startup and read-only afterwards.
///
/// This replaces annotation introspection with an explicit registration
/// API: base types declare their [`PolyMeta`], subtype relationships are
/// registered per base (transitively, a subtype may itself be a base),
/// and individual contexts may override with an opt-out or a custom
/// resolver.
///
/// The registry holds no cache and performs no resolution itself; it is
/// the lookup collaborator consumed by [`TagResolver`](crate::resolver::TagResolver).
///
/// # Example
///
/// ```
/// use poly_tag::registry::{IdKind, Inclusion, PolyMeta, PolyRegistry};
///
/// trait Shape {}
/// struct Circle;
/// struct Square;
///
/// let mut registry = PolyRegistry::new();
/// registry
///     .register_base::<dyn Shape>(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject))
///     .unwrap();
/// registry.register_subtype_named::<dyn Shape, Circle>("circle");
/// registry.register_subtype_named::<dyn Shape, Square>("square");
///
/// let subtypes = registry.collect_subtypes(poly_tag::TypeKey::of::<dyn Shape>());
/// assert_eq!(subtypes.len(), 2);
/// ```
#[derive(Default)]
pub struct PolyRegistry {
    contexts: HashMap<ContextKey, ContextEntry>,
    subtypes: TypeIdMap<Vec<NamedSubtype>>,
}

impl PolyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -- registration ---------------------------------------------------------

    /// Declares polymorphism metadata for a base type.
    pub fn register_base<B: ?Sized + 'static>(
        &mut self,
        meta: PolyMeta,
    ) -> Result<&mut Self, ConfigError> {
        self.set_meta(ContextKey::of_type(TypeKey::of::<B>()), meta)
    }

    /// Declares metadata for values of one property, overriding whatever
    /// the value's own type declares.
    pub fn register_property_meta<Owner: ?Sized + 'static>(
        &mut self,
        property: &'static str,
        meta: PolyMeta,
    ) -> Result<&mut Self, ConfigError> {
        self.set_meta(ContextKey::of_property(TypeKey::of::<Owner>(), property), meta)
    }

    /// Declares that a base type opts out of type tagging entirely.
    ///
    /// The opt-out is terminal: it silences declared metadata further
    /// out *and* process-wide default typing.
    pub fn register_no_type_info<B: ?Sized + 'static>(&mut self) -> Result<&mut Self, ConfigError> {
        self.set_no_type_info(ContextKey::of_type(TypeKey::of::<B>()))
    }

    /// Declares the opt-out for values of one property.
    pub fn register_property_no_type_info<Owner: ?Sized + 'static>(
        &mut self,
        property: &'static str,
    ) -> Result<&mut Self, ConfigError> {
        self.set_no_type_info(ContextKey::of_property(TypeKey::of::<Owner>(), property))
    }

    /// Registers a subtype of a base, with its short type name as the
    /// logical name.
    pub fn register_subtype<B: ?Sized + 'static, S: 'static>(&mut self) -> &mut Self {
        self.insert_subtype(TypeId::of::<B>(), NamedSubtype::of::<S>());
        self
    }

    /// Registers a subtype of a base under an explicit logical name.
    pub fn register_subtype_named<B: ?Sized + 'static, S: 'static>(
        &mut self,
        name: &'static str,
    ) -> &mut Self {
        self.insert_subtype(TypeId::of::<B>(), NamedSubtype::named::<S>(name));
        self
    }

    /// Supplies a fully custom resolver for a base type, bypassing the
    /// standard construction pipeline.
    pub fn register_custom_builder<B: ?Sized + 'static>(
        &mut self,
        builder: Arc<dyn CustomTagResolver>,
    ) -> &mut Self {
        self.entry(ContextKey::of_type(TypeKey::of::<B>()))
            .custom_builder = Some(builder);
        self
    }

    /// Supplies a custom resolver for values of one property.
    pub fn register_property_custom_builder<Owner: ?Sized + 'static>(
        &mut self,
        property: &'static str,
        builder: Arc<dyn CustomTagResolver>,
    ) -> &mut Self {
        self.entry(ContextKey::of_property(TypeKey::of::<Owner>(), property))
            .custom_builder = Some(builder);
        self
    }

    /// Supplies a custom id-resolver factory for a base type, replacing
    /// the standard id mechanisms while keeping the standard writer.
    pub fn register_custom_id_resolver<B: ?Sized + 'static>(
        &mut self,
        factory: Arc<dyn IdResolverFactory>,
    ) -> &mut Self {
        self.entry(ContextKey::of_type(TypeKey::of::<B>()))
            .custom_id_resolver = Some(factory);
        self
    }

    // -- lookup ---------------------------------------------------------------

    /// The metadata declared exactly at `context`, if any.
    pub fn find_meta(&self, context: ContextKey) -> Option<&PolyMeta> {
        self.contexts.get(&context).and_then(|e| e.meta.as_ref())
    }

    /// Whether `context` declares the "no type information" opt-out.
    pub fn has_no_type_info(&self, context: ContextKey) -> bool {
        self.contexts
            .get(&context)
            .is_some_and(|e| e.no_type_info)
    }

    /// The custom resolver declared exactly at `context`, if any.
    pub fn find_custom_builder(&self, context: ContextKey) -> Option<&Arc<dyn CustomTagResolver>> {
        self.contexts
            .get(&context)
            .and_then(|e| e.custom_builder.as_ref())
    }

    /// The custom id-resolver factory declared exactly at `context`, if any.
    pub fn find_custom_id_resolver(
        &self,
        context: ContextKey,
    ) -> Option<&Arc<dyn IdResolverFactory>> {
        self.contexts
            .get(&context)
            .and_then(|e| e.custom_id_resolver.as_ref())
    }

    /// Collects the full subtype set of a base, walking declared subtype
    /// relationships transitively. The first declaration of a type wins.
    pub fn collect_subtypes(&self, base: TypeKey) -> SubtypeSet {
        let mut set = SubtypeSet::new();
        let mut visited = TypeIdSet::default();
        let mut pending = Vec::new();

        visited.insert(base.id());
        pending.push(base.id());
        while let Some(type_id) = pending.pop() {
            for subtype in self.subtypes.get(&type_id).into_iter().flatten() {
                set.insert(*subtype);
                if visited.insert(subtype.key().id()) {
                    pending.push(subtype.key().id());
                }
            }
        }
        set
    }

    pub(crate) fn context(&self, key: ContextKey) -> Option<&ContextEntry> {
        self.contexts.get(&key)
    }

    // -- internals ------------------------------------------------------------

    fn entry(&mut self, key: ContextKey) -> &mut ContextEntry {
        self.contexts.entry(key).or_default()
    }

    fn set_meta(&mut self, key: ContextKey, meta: PolyMeta) -> Result<&mut Self, ConfigError> {
        let entry = self.entry(key);
        if entry.meta.is_some() || entry.no_type_info {
            return Err(ConfigError::ConflictingDeclarations {
                context: describe(key),
            });
        }
        entry.meta = Some(meta);
        Ok(self)
    }

    fn set_no_type_info(&mut self, key: ContextKey) -> Result<&mut Self, ConfigError> {
        let entry = self.entry(key);
        if entry.meta.is_some() {
            return Err(ConfigError::ConflictingDeclarations {
                context: describe(key),
            });
        }
        entry.no_type_info = true;
        Ok(self)
    }

    fn insert_subtype(&mut self, base: TypeId, subtype: NamedSubtype) {
        self.subtypes.entry(base).or_default().push(subtype);
    }
}

fn describe(key: ContextKey) -> Cow<'static, str> {
    match key.property {
        Some(property) => Cow::Owned(format!("{:?}.{property}", key.type_id)),
        None => Cow::Owned(format!("{:?}", key.type_id)),
    }
}

// -----------------------------------------------------------------------------
// auto_register

#[cfg(feature = "auto_register")]
mod auto_register {
    use super::{NamedSubtype, PolyRegistry, TypeKey};

    /// One statically submitted subtype relationship.
    ///
    /// Usually declared through [`register_subtypes!`](crate::register_subtypes)
    /// rather than constructed by hand.
    pub struct SubtypeRegistration {
        base: fn() -> TypeKey,
        subtype: fn() -> TypeKey,
        name: Option<&'static str>,
    }

    impl SubtypeRegistration {
        pub const fn new<B: ?Sized + 'static, S: 'static>(name: Option<&'static str>) -> Self {
            Self {
                base: TypeKey::of::<B>,
                subtype: TypeKey::of::<S>,
                name,
            }
        }
    }

    inventory::collect!(SubtypeRegistration);

    impl PolyRegistry {
        /// Registers every statically submitted subtype relationship.
        ///
        /// Repeated calls are cheap and will not insert duplicates into
        /// a collected set. On platforms without static registration
        /// support this is a no-op.
        pub fn auto_register(&mut self) -> &mut Self {
            for registration in inventory::iter::<SubtypeRegistration> {
                let base = (registration.base)();
                let subtype = (registration.subtype)();
                self.insert_subtype(
                    base.id(),
                    NamedSubtype::from_key(subtype, registration.name),
                );
            }
            self
        }
    }
}

#[cfg(feature = "auto_register")]
pub use auto_register::SubtypeRegistration;

/// Statically declares subtype relationships, collected later by
/// [`PolyRegistry::auto_register`].
///
/// ```
/// use poly_tag::register_subtypes;
///
/// trait Shape {}
/// struct Circle;
/// struct Square;
///
/// register_subtypes! {
///     dyn Shape {
///         Circle = "circle",
///         Square,
///     }
/// }
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! register_subtypes {
    ($base:ty { $($sub:ty $(= $name:literal)?),+ $(,)? }) => {
        $(
            $crate::__macro_exports::inventory::submit! {
                $crate::registry::SubtypeRegistration::new::<$base, $sub>(
                    $crate::register_subtypes!(@name $($name)?)
                )
            }
        )+
    };
    (@name $name:literal) => { ::core::option::Option::Some($name) };
    (@name) => { ::core::option::Option::None };
}

// -----------------------------------------------------------------------------
// PolyRegistryArc

#[cfg(feature = "std")]
mod registry_arc {
    use alloc::sync::Arc;
    use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    use super::PolyRegistry;

    /// A shared, lock-guarded [`PolyRegistry`] handle.
    ///
    /// Meant for the usual lifecycle where registration happens once at
    /// startup (under [`write`](Self::write)) and every later consumer
    /// only reads.
    #[derive(Clone, Default)]
    pub struct PolyRegistryArc {
        /// The wrapped [`PolyRegistry`].
        pub internal: Arc<RwLock<PolyRegistry>>,
    }

    impl PolyRegistryArc {
        /// Takes a read lock on the underlying [`PolyRegistry`].
        pub fn read(&self) -> RwLockReadGuard<'_, PolyRegistry> {
            self.internal.read().unwrap_or_else(PoisonError::into_inner)
        }

        /// Takes a write lock on the underlying [`PolyRegistry`].
        pub fn write(&self) -> RwLockWriteGuard<'_, PolyRegistry> {
            self.internal
                .write()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(feature = "std")]
pub use registry_arc::PolyRegistryArc;

#[cfg(test)]
mod tests {
    use super::{ContextKey, PolyRegistry};
    use crate::error::ConfigError;
    use crate::key::TypeKey;
    use crate::registry::{IdKind, Inclusion, PolyMeta};

    trait Shape {}
    struct Circle;

    // Circle refines further.
    struct DottedCircle;
    struct SolidCircle;

    fn meta() -> PolyMeta {
        PolyMeta::new(IdKind::Logical, Inclusion::WrapperArray)
    }

    #[test]
    fn transitive_subtype_collection() {
        let mut registry = PolyRegistry::new();
        registry.register_subtype_named::<dyn Shape, Circle>("circle");
        registry.register_subtype_named::<Circle, DottedCircle>("dotted");
        registry.register_subtype_named::<Circle, SolidCircle>("solid");

        let set = registry.collect_subtypes(TypeKey::of::<dyn Shape>());
        assert_eq!(set.len(), 3);
        assert!(set.contains(TypeKey::of::<DottedCircle>()));

        let from_circle = registry.collect_subtypes(TypeKey::of::<Circle>());
        assert_eq!(from_circle.len(), 2);
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let mut registry = PolyRegistry::new();
        registry.register_base::<dyn Shape>(meta()).unwrap();

        assert!(matches!(
            registry.register_base::<dyn Shape>(meta()),
            Err(ConfigError::ConflictingDeclarations { .. })
        ));
        assert!(matches!(
            registry.register_no_type_info::<dyn Shape>(),
            Err(ConfigError::ConflictingDeclarations { .. })
        ));
    }

    #[cfg(feature = "auto_register")]
    mod statically_registered {
        use super::*;

        trait Widget {}
        struct Knob;
        struct Slider;
        impl Widget for Knob {}
        impl Widget for Slider {}

        crate::register_subtypes! {
            dyn Widget {
                Knob = "knob",
                Slider,
            }
        }

        #[test]
        fn auto_register_collects_submitted_subtypes() {
            let mut registry = PolyRegistry::new();
            registry.auto_register();

            let set = registry.collect_subtypes(TypeKey::of::<dyn Widget>());
            assert!(set.contains(TypeKey::of::<Knob>()));
            assert!(set.contains(TypeKey::of::<Slider>()));

            // Draining twice must not duplicate anything.
            registry.auto_register();
            let again = registry.collect_subtypes(TypeKey::of::<dyn Widget>());
            assert_eq!(again.len(), set.len());
        }
    }

    #[test]
    fn property_contexts_are_distinct_from_type_contexts() {
        struct Scene;

        let mut registry = PolyRegistry::new();
        registry.register_base::<dyn Shape>(meta()).unwrap();
        registry
            .register_property_no_type_info::<Scene>("outline")
            .unwrap();

        let type_key = ContextKey::of_type(TypeKey::of::<dyn Shape>());
        let prop_key = ContextKey::of_property(TypeKey::of::<Scene>(), "outline");

        assert!(registry.find_meta(type_key).is_some());
        assert!(!registry.has_no_type_info(type_key));
        assert!(registry.has_no_type_info(prop_key));
    }
}
