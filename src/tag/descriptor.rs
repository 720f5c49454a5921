use alloc::borrow::Cow;

use crate::document::DocScope;
use crate::key::{TagValue, TypeKey};
use crate::registry::Inclusion;

// -----------------------------------------------------------------------------
// TagShape

/// The structural shape a value will be written as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagShape {
    /// A single scalar token.
    Scalar,
    /// An object scope with member tokens.
    Object,
    /// An array scope with element tokens.
    Array,
}

// -----------------------------------------------------------------------------
// TagDescriptor

/// The scopes a prefix call actually opened, to be closed by the suffix.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Opened {
    /// A wrapper scope around the value (wrapper strategies, or the
    /// synthetic object of property inclusion with non-object shapes).
    pub(crate) wrapper: Option<DocScope>,
    /// The value's own object or array scope.
    pub(crate) value_scope: Option<DocScope>,
}

/// One type-tag operation in flight.
///
/// Built by [`TypeTagWriter::tag`](crate::tag::TypeTagWriter::tag)
/// immediately before a write, filled in by `write_prefix`, and consumed
/// by value by the matching `write_suffix` — the ownership transfer is
/// what makes a suffix without its prefix unrepresentable. Never reused,
/// never shared between operations.
pub struct TagDescriptor<'a> {
    value: &'a dyn TagValue,
    shape: TagShape,
    inclusion: Inclusion,
    property: Option<Cow<'static, str>>,
    id: Option<Cow<'static, str>>,
    key_override: Option<TypeKey>,
    pub(crate) opened: Opened,
}

impl<'a> TagDescriptor<'a> {
    pub(crate) fn new(
        value: &'a dyn TagValue,
        shape: TagShape,
        inclusion: Inclusion,
        property: Option<Cow<'static, str>>,
    ) -> Self {
        Self {
            value,
            shape,
            inclusion,
            property,
            id: None,
            key_override: None,
            opened: Opened::default(),
        }
    }

    /// The value being tagged.
    #[inline(always)]
    pub fn value(&self) -> &'a dyn TagValue {
        self.value
    }

    /// The shape the value will be written as.
    #[inline(always)]
    pub const fn shape(&self) -> TagShape {
        self.shape
    }

    /// The inclusion strategy in effect.
    #[inline(always)]
    pub const fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The tag property name, for property-based inclusions.
    #[inline]
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The id to embed; unset until the prefix call computes it (or a
    /// caller supplied one up front).
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Pre-sets the id, skipping resolver computation in the prefix.
    pub(crate) fn set_id(&mut self, id: Cow<'static, str>) {
        self.id = Some(id);
    }

    pub(crate) fn id_cow(&self) -> Option<&Cow<'static, str>> {
        self.id.as_ref()
    }

    pub(crate) fn property_cow(&self) -> Option<&Cow<'static, str>> {
        self.property.as_ref()
    }

    /// Overrides the type the id is computed from.
    pub(crate) fn set_key_override(&mut self, key: TypeKey) {
        self.key_override = Some(key);
    }

    /// The type the id is computed from: the override if present,
    /// otherwise the value's runtime type.
    #[inline]
    pub fn key_for_id(&self) -> TypeKey {
        match self.key_override {
            Some(key) => key,
            None => self.value.type_key(),
        }
    }

    /// Whether an id-computation override is present.
    #[inline]
    pub const fn has_key_override(&self) -> bool {
        self.key_override.is_some()
    }
}
