use alloc::borrow::Cow;
use core::fmt;

use crate::key::TypeKey;

// -----------------------------------------------------------------------------
// Inclusion

/// The placement policy for a type tag relative to the value's own
/// document structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Inclusion {
    /// The id merges into an already-existing member of the payload; the
    /// tag writer itself defers and writes nothing for object shapes.
    PayloadProperty,
    /// The id is written as a sibling member in the *enclosing* object.
    ParentProperty,
    /// The id is written as a dedicated member ahead of the value's own
    /// members (a synthetic wrapper object is opened for non-object shapes).
    MetadataProperty,
    /// The value is wrapped in a two element array `[id, value]`.
    WrapperArray,
    /// The value is wrapped in an object whose single member key *is* the id.
    WrapperObject,
}

impl Inclusion {
    /// Whether this inclusion carries a tag property name.
    #[inline]
    pub const fn requires_property(self) -> bool {
        matches!(
            self,
            Self::PayloadProperty | Self::ParentProperty | Self::MetadataProperty
        )
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadProperty => f.pad("payload-property"),
            Self::ParentProperty => f.pad("parent-property"),
            Self::MetadataProperty => f.pad("metadata-property"),
            Self::WrapperArray => f.pad("wrapper-array"),
            Self::WrapperObject => f.pad("wrapper-object"),
        }
    }
}

// -----------------------------------------------------------------------------
// IdKind

/// How type ids are computed from runtime types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// The full type path, e.g. `my_crate::shapes::Circle`.
    TypePath,
    /// The short type name, e.g. `Circle`.
    TypeName,
    /// Logical names from the declared subtype set.
    Logical,
    /// A caller-supplied id resolver.
    Custom,
}

impl IdKind {
    /// The default tag property name for this mechanism, used when a
    /// property-based inclusion declares no explicit name.
    ///
    /// Custom mechanisms have no derivable default.
    pub const fn default_property(self) -> Option<&'static str> {
        match self {
            Self::TypePath => Some("@class"),
            Self::TypeName => Some("@c"),
            Self::Logical => Some("@type"),
            Self::Custom => None,
        }
    }
}

// -----------------------------------------------------------------------------
// PolyMeta

/// Declared polymorphism metadata for a base type or property context.
///
/// An immutable configuration value: the `with_*` methods return updated
/// copies, so resolution can thread adjustments (such as the
/// parent-property downgrade) through a pure pipeline.
///
/// # Example
///
/// ```
/// use poly_tag::registry::{IdKind, Inclusion, PolyMeta};
///
/// let meta = PolyMeta::new(IdKind::Logical, Inclusion::MetadataProperty)
///     .with_property("kind");
/// assert_eq!(meta.property_name(), Some("kind"));
/// ```
#[derive(Clone, Debug)]
pub struct PolyMeta {
    inclusion: Inclusion,
    id_kind: IdKind,
    property: Option<Cow<'static, str>>,
    default_impl: Option<TypeKey>,
}

impl PolyMeta {
    /// Creates metadata with the given id mechanism and tag placement.
    pub const fn new(id_kind: IdKind, inclusion: Inclusion) -> Self {
        Self {
            inclusion,
            id_kind,
            property: None,
            default_impl: None,
        }
    }

    /// Sets an explicit tag property name.
    pub fn with_property(mut self, property: impl Into<Cow<'static, str>>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Replaces the inclusion strategy.
    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Declares the concrete type to fall back to on read-back when no
    /// id is present or an id is unrecognized.
    pub fn with_default_impl<T: 'static>(mut self) -> Self {
        self.default_impl = Some(TypeKey::of::<T>());
        self
    }

    /// See [`with_default_impl`](Self::with_default_impl).
    pub fn with_default_impl_key(mut self, key: TypeKey) -> Self {
        self.default_impl = Some(key);
        self
    }

    /// The declared tag placement.
    #[inline(always)]
    pub const fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The declared id mechanism.
    #[inline(always)]
    pub const fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    /// The explicitly declared tag property name, if any.
    #[inline]
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The tag property name in effect: the explicit one, or the
    /// mechanism default.
    pub fn resolved_property_name(&self) -> Option<Cow<'static, str>> {
        match &self.property {
            Some(name) => Some(name.clone()),
            None => self.id_kind.default_property().map(Cow::Borrowed),
        }
    }

    /// The declared default implementation for read-back.
    #[inline(always)]
    pub const fn default_impl(&self) -> Option<TypeKey> {
        self.default_impl
    }
}

#[cfg(test)]
mod tests {
    use super::{IdKind, Inclusion, PolyMeta};

    #[test]
    fn property_name_defaults_follow_id_kind() {
        let logical = PolyMeta::new(IdKind::Logical, Inclusion::MetadataProperty);
        assert_eq!(logical.resolved_property_name().as_deref(), Some("@type"));

        let path = PolyMeta::new(IdKind::TypePath, Inclusion::MetadataProperty);
        assert_eq!(path.resolved_property_name().as_deref(), Some("@class"));

        let name = PolyMeta::new(IdKind::TypeName, Inclusion::MetadataProperty);
        assert_eq!(name.resolved_property_name().as_deref(), Some("@c"));

        let custom = PolyMeta::new(IdKind::Custom, Inclusion::MetadataProperty);
        assert_eq!(custom.resolved_property_name(), None);
    }

    #[test]
    fn explicit_property_wins() {
        let meta = PolyMeta::new(IdKind::Logical, Inclusion::MetadataProperty)
            .with_property("kind");
        assert_eq!(meta.resolved_property_name().as_deref(), Some("kind"));
    }
}
