use crate::key::TypeKey;

// -----------------------------------------------------------------------------
// PropertyContext

/// A property (or container element) through which a polymorphic value is
/// declared.
///
/// Carries the declaring type, the property name within it, and the
/// declared value type, plus an optional per-property override of the tag
/// property name.
///
/// # Example
///
/// ```
/// use poly_tag::PropertyContext;
///
/// struct Scene;
/// trait Shape {}
///
/// let ctx = PropertyContext::new::<Scene, dyn Shape>("outline")
///     .with_tag_property("kind");
/// assert_eq!(ctx.name(), "outline");
/// assert!(ctx.value_type().is::<dyn Shape>());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PropertyContext {
    owner: TypeKey,
    name: &'static str,
    value_type: TypeKey,
    tag_property: Option<&'static str>,
}

impl PropertyContext {
    /// Creates the context of property `name`, declared on `Owner` with
    /// value type `Value`.
    pub fn new<Owner: ?Sized + 'static, Value: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            owner: TypeKey::of::<Owner>(),
            name,
            value_type: TypeKey::of::<Value>(),
            tag_property: None,
        }
    }

    /// Overrides the tag property name for values of this property.
    pub const fn with_tag_property(mut self, property: &'static str) -> Self {
        self.tag_property = Some(property);
        self
    }

    /// The type declaring the property.
    #[inline(always)]
    pub const fn owner(&self) -> TypeKey {
        self.owner
    }

    /// The property name within the owner.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared (static) type of the property's values.
    #[inline(always)]
    pub const fn value_type(&self) -> TypeKey {
        self.value_type
    }

    /// The per-property tag property override, if any.
    #[inline(always)]
    pub const fn tag_property(&self) -> Option<&'static str> {
        self.tag_property
    }
}

// -----------------------------------------------------------------------------
// TagContext

/// The declaring context a resolution runs for: either a bare base type,
/// or a property whose declared type is the base.
///
/// Property contexts are more specific than type contexts; resolution
/// consults the property declaration first and falls back to the
/// declarations of the base type itself.
#[derive(Clone, Copy, Debug)]
pub enum TagContext<'a> {
    /// A base type outside of any enclosing property.
    Type(TypeKey),
    /// A property whose declared value type is the base type.
    Property(&'a PropertyContext),
}

impl TagContext<'_> {
    /// Shorthand for a bare type context.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// The base type the resolution is about.
    #[inline]
    pub const fn base_type(&self) -> TypeKey {
        match self {
            Self::Type(key) => *key,
            Self::Property(prop) => prop.value_type(),
        }
    }

    /// Whether there is an enclosing property to attach sibling ids to.
    #[inline]
    pub const fn is_property(&self) -> bool {
        matches!(self, Self::Property(_))
    }
}
