//! Turns declared configuration into ready-to-use tag writers and readers.
//!
//! ## Menu
//!
//! - [`TagResolver`]: this module's entry point, bundling a
//!   [`PolyRegistry`] with an optional [`DefaultTyping`] policy.
//! - [`CustomTagResolver`]: a caller-supplied builder bypassing the
//!   standard pipeline for one context.
//! - [`DefaultTyping`] / [`DefaultTypingRule`]: process-wide fallback
//!   metadata for types that declare none.
//!
//! Resolution is a pure function of the registry and the context; the
//! resolver holds no cache and no mutable state, so it can be rebuilt
//! cheaply or shared freely.

// -----------------------------------------------------------------------------
// Modules

mod default_typing;

pub use default_typing::{DefaultTyping, DefaultTypingRule};

// -----------------------------------------------------------------------------
// CustomTagResolver

use alloc::borrow::Cow;
use alloc::sync::Arc;

use crate::context::TagContext;
use crate::error::ConfigError;
use crate::id::{
    IdResolverFactory, LogicalNameIdResolver, TypeIdResolver, TypeNameIdResolver,
    TypePathIdResolver,
};
use crate::key::TypeKey;
use crate::registry::{ContextKey, IdKind, Inclusion, PolyMeta, PolyRegistry, SubtypeSet};
use crate::tag::{TypeTagReader, TypeTagWriter};

/// A caller-supplied builder that replaces the standard construction
/// pipeline for one context.
///
/// When a context registers one, resolution hands over the base type and
/// its collected subtype set and uses whatever the builder returns,
/// ignoring declared metadata and default typing. An explicit opt-out
/// registered at the *same* context still silences it.
pub trait CustomTagResolver: Send + Sync {
    /// Builds the writer for serialization in this context.
    fn build_writer(
        &self,
        base: TypeKey,
        subtypes: &SubtypeSet,
    ) -> Result<TypeTagWriter, ConfigError>;

    /// Builds the reader for deserialization in this context.
    fn build_reader(
        &self,
        base: TypeKey,
        subtypes: &SubtypeSet,
    ) -> Result<TypeTagReader, ConfigError>;
}

// -----------------------------------------------------------------------------
// TagResolver

/// Resolves the tag writer or reader for a context.
///
/// The decision procedure, most specific wins:
///
/// 1. An explicit opt-out at the most specific declared context is
///    terminal: no tagging, and default typing does not apply.
/// 2. A custom [`CustomTagResolver`] at that context takes over
///    construction entirely.
/// 3. Declared [`PolyMeta`] (property declaration before the value
///    type's own) feeds the standard pipeline.
/// 4. Otherwise the [`DefaultTyping`] policy, if any, may supply
///    metadata; its subtype set is empty.
///
/// # Example
///
/// ```
/// use poly_tag::registry::{IdKind, Inclusion, PolyMeta, PolyRegistry};
/// use poly_tag::resolver::TagResolver;
/// use poly_tag::TagContext;
///
/// trait Shape {}
///
/// let mut registry = PolyRegistry::new();
/// registry
///     .register_base::<dyn Shape>(PolyMeta::new(IdKind::TypeName, Inclusion::WrapperArray))
///     .unwrap();
///
/// let resolver = TagResolver::new(&registry);
/// let writer = resolver
///     .resolve_serializer(&TagContext::of::<dyn Shape>())
///     .unwrap()
///     .expect("declared base resolves to a writer");
/// assert_eq!(writer.inclusion(), Inclusion::WrapperArray);
/// ```
pub struct TagResolver<'r> {
    registry: &'r PolyRegistry,
    default_typing: Option<&'r dyn DefaultTyping>,
}

/// The outcome of walking the declared contexts.
enum Choice {
    /// No declaration anywhere, or a terminal opt-out.
    None,
    /// A custom builder takes over.
    Custom(Arc<dyn CustomTagResolver>),
    /// Declared or defaulted metadata feeds the standard pipeline.
    Standard {
        meta: PolyMeta,
        /// Explicitly declared, as opposed to supplied by default typing.
        /// Only declared metadata gets the registered subtype set.
        declared: bool,
    },
}

impl<'r> TagResolver<'r> {
    /// A resolver over `registry` with no default typing.
    pub const fn new(registry: &'r PolyRegistry) -> Self {
        Self {
            registry,
            default_typing: None,
        }
    }

    /// Installs a process-wide default typing policy.
    pub const fn with_default_typing(mut self, policy: &'r dyn DefaultTyping) -> Self {
        self.default_typing = Some(policy);
        self
    }

    /// Resolves the writer for serializing values in `ctx`.
    ///
    /// `Ok(None)` means the context carries no type information, either
    /// because nothing is declared or because of an explicit opt-out.
    pub fn resolve_serializer(
        &self,
        ctx: &TagContext<'_>,
    ) -> Result<Option<TypeTagWriter>, ConfigError> {
        let base = ctx.base_type();
        let writer = match self.choose(ctx) {
            Choice::None => return Ok(None),
            Choice::Custom(builder) => {
                let subtypes = self.registry.collect_subtypes(base);
                builder.build_writer(base, &subtypes)?
            }
            Choice::Standard { meta, declared } => {
                let meta = Self::normalize(meta, ctx);
                let subtypes = self.declared_subtypes(base, declared);
                let id_resolver = self.make_id_resolver(base, &meta, &subtypes)?;
                let property = Self::property_name(base, &meta)?;
                TypeTagWriter::new(meta.inclusion(), property, id_resolver)
            }
        };
        Ok(Some(match ctx {
            TagContext::Property(p) => writer.for_property(p),
            TagContext::Type(_) => writer,
        }))
    }

    /// Resolves the reader for deserializing values in `ctx`.
    ///
    /// `abstract_mapper` stands in for an abstract-type mapping layer:
    /// when the declared metadata names no default implementation, it is
    /// consulted for one, and its answer is kept only if it maps the
    /// base to a *distinct* concrete type.
    pub fn resolve_deserializer(
        &self,
        ctx: &TagContext<'_>,
        abstract_mapper: Option<&dyn Fn(&TypeKey) -> Option<TypeKey>>,
    ) -> Result<Option<TypeTagReader>, ConfigError> {
        let base = ctx.base_type();
        let reader = match self.choose(ctx) {
            Choice::None => return Ok(None),
            Choice::Custom(builder) => {
                let subtypes = self.registry.collect_subtypes(base);
                builder.build_reader(base, &subtypes)?
            }
            Choice::Standard { meta, declared } => {
                let meta = Self::normalize(meta, ctx);
                let subtypes = self.declared_subtypes(base, declared);
                let id_resolver = self.make_id_resolver(base, &meta, &subtypes)?;
                let property = Self::property_name(base, &meta)?;
                let default_impl = meta.default_impl().or_else(|| {
                    abstract_mapper
                        .and_then(|mapper| mapper(&base))
                        .filter(|mapped| *mapped != base)
                });
                TypeTagReader::new(base, meta.inclusion(), property, id_resolver, default_impl)
            }
        };
        Ok(Some(match ctx {
            TagContext::Property(p) => reader.for_property(p),
            TagContext::Type(_) => reader,
        }))
    }

    // -- decision procedure ---------------------------------------------------

    /// Walks the declared contexts from most to least specific and picks
    /// the governing declaration.
    fn choose(&self, ctx: &TagContext<'_>) -> Choice {
        let base = ctx.base_type();
        let levels: [Option<ContextKey>; 2] = match ctx {
            TagContext::Property(p) => [
                Some(ContextKey::of_property(p.owner(), p.name())),
                Some(ContextKey::of_type(base)),
            ],
            TagContext::Type(_) => [Some(ContextKey::of_type(base)), None],
        };

        for key in levels.into_iter().flatten() {
            let Some(entry) = self.registry.context(key) else {
                continue;
            };
            // The opt-out is terminal at its own context: it silences a
            // custom builder declared alongside it, metadata declared
            // further out, and default typing.
            if entry.no_type_info {
                return Choice::None;
            }
            if let Some(builder) = &entry.custom_builder {
                return Choice::Custom(Arc::clone(builder));
            }
            if let Some(meta) = &entry.meta {
                return Choice::Standard {
                    meta: meta.clone(),
                    declared: true,
                };
            }
        }

        match self
            .default_typing
            .and_then(|policy| policy.default_meta_for(&base))
        {
            Some(meta) => Choice::Standard {
                meta,
                declared: false,
            },
            None => Choice::None,
        }
    }

    /// Parent-property inclusion needs an enclosing object to host the
    /// sibling id; on a bare type context there is none, so it degrades
    /// to leading-member inclusion.
    fn normalize(meta: PolyMeta, ctx: &TagContext<'_>) -> PolyMeta {
        if meta.inclusion() == Inclusion::ParentProperty && !ctx.is_property() {
            meta.with_inclusion(Inclusion::MetadataProperty)
        } else {
            meta
        }
    }

    /// Default typing carries no subtype declarations; only explicitly
    /// declared metadata gets the registered set.
    fn declared_subtypes(&self, base: TypeKey, declared: bool) -> SubtypeSet {
        if declared {
            self.registry.collect_subtypes(base)
        } else {
            SubtypeSet::new()
        }
    }

    fn make_id_resolver(
        &self,
        base: TypeKey,
        meta: &PolyMeta,
        subtypes: &SubtypeSet,
    ) -> Result<Arc<dyn TypeIdResolver>, ConfigError> {
        if let Some(factory) = self.registry.find_custom_id_resolver(ContextKey::of_type(base)) {
            return factory.build(base, subtypes);
        }
        match meta.id_kind() {
            IdKind::TypePath => Ok(Arc::new(TypePathIdResolver::new(base, subtypes))),
            IdKind::TypeName => Ok(Arc::new(TypeNameIdResolver::new(base, subtypes))),
            IdKind::Logical => Ok(Arc::new(LogicalNameIdResolver::new(base, subtypes)?)),
            IdKind::Custom => Err(ConfigError::MissingIdResolver {
                base: Cow::Borrowed(base.path()),
            }),
        }
    }

    /// The tag property name for strategies that need one; wrapper
    /// strategies never carry a name even if one is declared.
    fn property_name(
        base: TypeKey,
        meta: &PolyMeta,
    ) -> Result<Option<Cow<'static, str>>, ConfigError> {
        if !meta.inclusion().requires_property() {
            return Ok(None);
        }
        meta.resolved_property_name()
            .map(Some)
            .ok_or(ConfigError::MissingPropertyName {
                base: Cow::Borrowed(base.path()),
            })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PropertyContext;

    trait Shape {}
    struct Circle;
    struct Square;
    impl Shape for Circle {}
    impl Shape for Square {}

    struct Drawing;

    fn shape_registry(meta: PolyMeta) -> PolyRegistry {
        let mut registry = PolyRegistry::new();
        registry.register_base::<dyn Shape>(meta).unwrap();
        registry
            .register_subtype_named::<dyn Shape, Circle>("circle")
            .register_subtype_named::<dyn Shape, Square>("square");
        registry
    }

    #[test]
    fn undeclared_types_resolve_to_nothing() {
        let registry = PolyRegistry::new();
        let resolver = TagResolver::new(&registry);
        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap();
        assert!(writer.is_none());
    }

    #[test]
    fn declared_base_builds_a_writer_with_its_subtypes() {
        let registry = shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        let resolver = TagResolver::new(&registry);
        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(writer.inclusion(), Inclusion::WrapperObject);
        assert_eq!(
            writer.id_resolver().id_for_type(&TypeKey::of::<Circle>()),
            "circle"
        );
        assert_eq!(
            writer.id_resolver().resolve_id("square"),
            Some(TypeKey::of::<Square>())
        );
    }

    #[test]
    fn property_declaration_overrides_the_value_types_own() {
        let mut registry =
            shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        registry
            .register_property_meta::<Drawing>(
                "outline",
                PolyMeta::new(IdKind::TypeName, Inclusion::WrapperArray),
            )
            .unwrap();
        let resolver = TagResolver::new(&registry);

        let ctx = PropertyContext::new::<Drawing, dyn Shape>("outline");
        let writer = resolver
            .resolve_serializer(&TagContext::Property(&ctx))
            .unwrap()
            .unwrap();
        assert_eq!(writer.inclusion(), Inclusion::WrapperArray);

        // The bare type context still sees the type-level declaration.
        let bare = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(bare.inclusion(), Inclusion::WrapperObject);
    }

    #[test]
    fn opt_out_is_terminal_and_silences_default_typing() {
        let mut registry =
            shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        registry
            .register_property_no_type_info::<Drawing>("outline")
            .unwrap();
        let policy =
            DefaultTypingRule::for_all(PolyMeta::new(IdKind::TypePath, Inclusion::WrapperArray));
        let resolver = TagResolver::new(&registry).with_default_typing(&policy);

        let ctx = PropertyContext::new::<Drawing, dyn Shape>("outline");
        let writer = resolver
            .resolve_serializer(&TagContext::Property(&ctx))
            .unwrap();
        assert!(writer.is_none());
    }

    #[test]
    fn default_typing_covers_undeclared_types_without_subtypes() {
        let registry = PolyRegistry::new();
        let policy =
            DefaultTypingRule::for_all(PolyMeta::new(IdKind::TypePath, Inclusion::WrapperArray));
        let resolver = TagResolver::new(&registry).with_default_typing(&policy);

        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(writer.inclusion(), Inclusion::WrapperArray);
        // No declarations, so ids write out but nothing resolves back.
        assert!(writer.id_resolver().resolve_id("anything").is_none());
    }

    #[test]
    fn parent_property_degrades_on_a_bare_type_context() {
        let registry = shape_registry(
            PolyMeta::new(IdKind::Logical, Inclusion::ParentProperty).with_property("kind"),
        );
        let resolver = TagResolver::new(&registry);

        let bare = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(bare.inclusion(), Inclusion::MetadataProperty);
        assert_eq!(bare.property_name(), Some("kind"));

        let ctx = PropertyContext::new::<Drawing, dyn Shape>("outline");
        let scoped = resolver
            .resolve_serializer(&TagContext::Property(&ctx))
            .unwrap()
            .unwrap();
        assert_eq!(scoped.inclusion(), Inclusion::ParentProperty);
    }

    #[test]
    fn custom_id_kind_without_a_factory_is_a_config_error() {
        let registry = shape_registry(PolyMeta::new(IdKind::Custom, Inclusion::WrapperArray));
        let resolver = TagResolver::new(&registry);
        let err = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingIdResolver { .. }));
    }

    #[test]
    fn custom_builder_takes_over_construction() {
        struct FixedBuilder;
        impl CustomTagResolver for FixedBuilder {
            fn build_writer(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<TypeTagWriter, ConfigError> {
                Ok(TypeTagWriter::new(
                    Inclusion::MetadataProperty,
                    Some(Cow::Borrowed("custom-tag")),
                    Arc::new(TypeNameIdResolver::new(base, subtypes)),
                ))
            }

            fn build_reader(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<TypeTagReader, ConfigError> {
                Ok(TypeTagReader::new(
                    base,
                    Inclusion::MetadataProperty,
                    Some(Cow::Borrowed("custom-tag")),
                    Arc::new(TypeNameIdResolver::new(base, subtypes)),
                    None,
                ))
            }
        }

        let mut registry =
            shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        registry.register_custom_builder::<dyn Shape>(Arc::new(FixedBuilder));
        let resolver = TagResolver::new(&registry);

        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(writer.inclusion(), Inclusion::MetadataProperty);
        assert_eq!(writer.property_name(), Some("custom-tag"));
    }

    #[test]
    fn property_level_custom_builder_outranks_a_type_level_opt_out() {
        struct FixedBuilder;
        impl CustomTagResolver for FixedBuilder {
            fn build_writer(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<TypeTagWriter, ConfigError> {
                Ok(TypeTagWriter::new(
                    Inclusion::WrapperArray,
                    None,
                    Arc::new(TypePathIdResolver::new(base, subtypes)),
                ))
            }

            fn build_reader(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<TypeTagReader, ConfigError> {
                Ok(TypeTagReader::new(
                    base,
                    Inclusion::WrapperArray,
                    None,
                    Arc::new(TypePathIdResolver::new(base, subtypes)),
                    None,
                ))
            }
        }

        let mut registry = PolyRegistry::new();
        registry.register_no_type_info::<dyn Shape>().unwrap();
        registry.register_property_custom_builder::<Drawing>("outline", Arc::new(FixedBuilder));
        let resolver = TagResolver::new(&registry);

        let ctx = PropertyContext::new::<Drawing, dyn Shape>("outline");
        let writer = resolver
            .resolve_serializer(&TagContext::Property(&ctx))
            .unwrap();
        assert!(writer.is_some());

        // At the bare type context the opt-out stands.
        let bare = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap();
        assert!(bare.is_none());
    }

    #[test]
    fn missing_property_name_is_rejected_for_naming_strategies() {
        // Custom ids have no default property name, so leading-member
        // inclusion needs an explicit one.
        struct PassthroughFactory;
        impl IdResolverFactory for PassthroughFactory {
            fn build(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<Arc<dyn TypeIdResolver>, ConfigError> {
                Ok(Arc::new(TypeNameIdResolver::new(base, subtypes)))
            }
        }

        let mut registry =
            shape_registry(PolyMeta::new(IdKind::Custom, Inclusion::MetadataProperty));
        registry.register_custom_id_resolver::<dyn Shape>(Arc::new(PassthroughFactory));
        let resolver = TagResolver::new(&registry);
        let err = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPropertyName { .. }));
    }

    #[test]
    fn custom_id_factory_feeds_the_standard_pipeline() {
        struct UppercaseFactory;
        struct UppercaseResolver {
            inner: TypeNameIdResolver,
        }
        impl TypeIdResolver for UppercaseResolver {
            fn id_kind(&self) -> IdKind {
                IdKind::Custom
            }
            fn id_for_type(&self, key: &TypeKey) -> Cow<'static, str> {
                Cow::Owned(self.inner.id_for_type(key).to_uppercase())
            }
            fn resolve_id(&self, id: &str) -> Option<TypeKey> {
                self.inner.resolve_id(&id.to_lowercase())
            }
        }
        impl IdResolverFactory for UppercaseFactory {
            fn build(
                &self,
                base: TypeKey,
                subtypes: &SubtypeSet,
            ) -> Result<Arc<dyn TypeIdResolver>, ConfigError> {
                Ok(Arc::new(UppercaseResolver {
                    inner: TypeNameIdResolver::new(base, subtypes),
                }))
            }
        }

        let mut registry = shape_registry(
            PolyMeta::new(IdKind::Custom, Inclusion::MetadataProperty).with_property("@type"),
        );
        registry.register_custom_id_resolver::<dyn Shape>(Arc::new(UppercaseFactory));
        let resolver = TagResolver::new(&registry);

        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(
            writer.id_resolver().id_for_type(&TypeKey::of::<Circle>()),
            "CIRCLE"
        );
        assert_eq!(
            writer.id_resolver().resolve_id("SQUARE"),
            Some(TypeKey::of::<Square>())
        );
    }

    #[test]
    fn deserialization_binds_a_declared_default_impl() {
        let registry = shape_registry(
            PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject)
                .with_default_impl::<Circle>(),
        );
        let resolver = TagResolver::new(&registry);
        let reader = resolver
            .resolve_deserializer(&TagContext::of::<dyn Shape>(), None)
            .unwrap()
            .unwrap();
        assert_eq!(reader.default_impl(), Some(TypeKey::of::<Circle>()));
    }

    #[test]
    fn abstract_mapper_supplies_a_default_impl_only_when_distinct() {
        let registry = shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        let resolver = TagResolver::new(&registry);

        let to_square: &dyn Fn(&TypeKey) -> Option<TypeKey> =
            &|_| Some(TypeKey::of::<Square>());
        let reader = resolver
            .resolve_deserializer(&TagContext::of::<dyn Shape>(), Some(to_square))
            .unwrap()
            .unwrap();
        assert_eq!(reader.default_impl(), Some(TypeKey::of::<Square>()));

        // Mapping the base back to itself adds nothing.
        let identity: &dyn Fn(&TypeKey) -> Option<TypeKey> = &|key| Some(*key);
        let reader = resolver
            .resolve_deserializer(&TagContext::of::<dyn Shape>(), Some(identity))
            .unwrap()
            .unwrap();
        assert_eq!(reader.default_impl(), None);
    }

    #[test]
    fn property_tag_name_override_flows_into_the_writer() {
        let registry = shape_registry(
            PolyMeta::new(IdKind::Logical, Inclusion::MetadataProperty).with_property("@type"),
        );
        let resolver = TagResolver::new(&registry);

        let ctx = PropertyContext::new::<Drawing, dyn Shape>("outline").with_tag_property("kind");
        let writer = resolver
            .resolve_serializer(&TagContext::Property(&ctx))
            .unwrap()
            .unwrap();
        assert_eq!(writer.property_name(), Some("kind"));
    }

    #[test]
    fn declared_metadata_outranks_default_typing() {
        let registry = shape_registry(PolyMeta::new(IdKind::Logical, Inclusion::WrapperObject));
        let policy =
            DefaultTypingRule::for_all(PolyMeta::new(IdKind::TypePath, Inclusion::WrapperArray));
        let resolver = TagResolver::new(&registry).with_default_typing(&policy);

        let writer = resolver
            .resolve_serializer(&TagContext::of::<dyn Shape>())
            .unwrap()
            .unwrap();
        assert_eq!(writer.inclusion(), Inclusion::WrapperObject);
    }
}
