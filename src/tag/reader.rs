use alloc::borrow::Cow;
use alloc::string::ToString;
use alloc::sync::Arc;

use crate::context::PropertyContext;
use crate::error::UnresolvedTypeError;
use crate::id::TypeIdResolver;
use crate::key::TypeKey;
use crate::registry::Inclusion;

// -----------------------------------------------------------------------------
// TypeTagReader

/// The read-side mirror of [`TypeTagWriter`](crate::tag::TypeTagWriter).
///
/// Resolves ids found in documents back to concrete types, honoring a
/// configured default implementation for missing or unrecognized ids.
/// Tag *extraction* from a concrete document representation lives with
/// the document adapter (see
/// [`split_tagged`](crate::document::json::split_tagged)); this type
/// only carries configuration and id resolution, so it stays format
/// agnostic.
///
/// Immutable and safe for unsynchronized concurrent use.
#[derive(Clone)]
pub struct TypeTagReader {
    base: TypeKey,
    inclusion: Inclusion,
    property: Option<Cow<'static, str>>,
    id_resolver: Arc<dyn TypeIdResolver>,
    default_impl: Option<TypeKey>,
}

impl TypeTagReader {
    /// Binds a reader to its configuration.
    ///
    /// Usually constructed by
    /// [`TagResolver`](crate::resolver::TagResolver); custom resolver
    /// builders use this directly.
    pub fn new(
        base: TypeKey,
        inclusion: Inclusion,
        property: Option<Cow<'static, str>>,
        id_resolver: Arc<dyn TypeIdResolver>,
        default_impl: Option<TypeKey>,
    ) -> Self {
        Self {
            base,
            inclusion,
            property,
            id_resolver,
            default_impl,
        }
    }

    /// Specializes the reader for values of one property.
    pub fn for_property(&self, context: &PropertyContext) -> Self {
        match context.tag_property() {
            Some(property) if self.inclusion.requires_property() => Self {
                property: Some(Cow::Borrowed(property)),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// The base type reads are declared against.
    #[inline(always)]
    pub const fn base(&self) -> TypeKey {
        self.base
    }

    /// The inclusion strategy tags were embedded with.
    #[inline(always)]
    pub const fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The tag property name, for property-based inclusions.
    #[inline]
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The id resolver in effect.
    #[inline]
    pub fn id_resolver(&self) -> &Arc<dyn TypeIdResolver> {
        &self.id_resolver
    }

    /// The concrete type to fall back to when no id is present or an id
    /// is unrecognized.
    #[inline(always)]
    pub const fn default_impl(&self) -> Option<TypeKey> {
        self.default_impl
    }

    /// Resolves an id read from a document, falling back to the default
    /// implementation for unrecognized ids.
    pub fn resolve_id(&self, id: &str) -> Result<TypeKey, UnresolvedTypeError> {
        self.id_resolver
            .resolve_id(id)
            .or(self.default_impl)
            .ok_or_else(|| UnresolvedTypeError {
                id: id.to_string(),
                base: self.base.path(),
            })
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::TypeTagReader;
    use crate::id::LogicalNameIdResolver;
    use crate::key::TypeKey;
    use crate::registry::{Inclusion, NamedSubtype, SubtypeSet};

    trait Shape {}
    struct Circle;
    struct Square;

    fn reader(default_impl: Option<TypeKey>) -> TypeTagReader {
        let base = TypeKey::of::<dyn Shape>();
        let subtypes: SubtypeSet = [NamedSubtype::named::<Circle>("circle")]
            .into_iter()
            .collect();
        let resolver = LogicalNameIdResolver::new(base, &subtypes).unwrap();
        TypeTagReader::new(
            base,
            Inclusion::WrapperArray,
            None,
            Arc::new(resolver),
            default_impl,
        )
    }

    #[test]
    fn known_ids_resolve() {
        assert_eq!(
            reader(None).resolve_id("circle").unwrap(),
            TypeKey::of::<Circle>()
        );
    }

    #[test]
    fn unknown_ids_fall_back_to_the_default_impl() {
        let err = reader(None).resolve_id("pentagon").unwrap_err();
        assert_eq!(err.id, "pentagon");

        let fallback = reader(Some(TypeKey::of::<Square>()));
        assert_eq!(
            fallback.resolve_id("pentagon").unwrap(),
            TypeKey::of::<Square>()
        );
    }
}
