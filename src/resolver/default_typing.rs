use crate::key::TypeKey;
use crate::registry::PolyMeta;

// -----------------------------------------------------------------------------
// DefaultTyping

/// A process-wide rule applying polymorphic tagging to base types that
/// declare no metadata of their own.
///
/// Passed explicitly into [`TagResolver`](crate::resolver::TagResolver)
/// at construction; set once at startup, read-only thereafter. Declared
/// metadata always wins over this policy, and an explicit opt-out
/// silences it entirely.
pub trait DefaultTyping: Send + Sync {
    /// The metadata to apply to `base`, if the policy covers it.
    fn default_meta_for(&self, base: &TypeKey) -> Option<PolyMeta>;
}

// -----------------------------------------------------------------------------
// DefaultTypingRule

/// A [`DefaultTyping`] policy from a predicate and a metadata template.
///
/// # Example
///
/// ```
/// use poly_tag::registry::{IdKind, Inclusion, PolyMeta};
/// use poly_tag::resolver::{DefaultTyping, DefaultTypingRule};
/// use poly_tag::TypeKey;
///
/// trait Shape {}
///
/// let rule = DefaultTypingRule::new(
///     PolyMeta::new(IdKind::TypePath, Inclusion::WrapperArray),
///     |base| base.name().ends_with("Shape"),
/// );
/// assert!(rule.default_meta_for(&TypeKey::of::<dyn Shape>()).is_some());
/// assert!(rule.default_meta_for(&TypeKey::of::<u32>()).is_none());
/// ```
pub struct DefaultTypingRule {
    meta: PolyMeta,
    applies: fn(&TypeKey) -> bool,
}

impl DefaultTypingRule {
    /// A rule covering the types matched by `applies`.
    pub const fn new(meta: PolyMeta, applies: fn(&TypeKey) -> bool) -> Self {
        Self { meta, applies }
    }

    /// A rule covering every base type.
    pub const fn for_all(meta: PolyMeta) -> Self {
        Self {
            meta,
            applies: |_| true,
        }
    }
}

impl DefaultTyping for DefaultTypingRule {
    fn default_meta_for(&self, base: &TypeKey) -> Option<PolyMeta> {
        (self.applies)(base).then(|| self.meta.clone())
    }
}
