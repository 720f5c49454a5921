use core::any::{Any, TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// TypeKey

/// The identity of a Rust type, used as the key for all tag resolution.
///
/// Combines a [`TypeId`] with the full type path and the short type name.
/// Unsized types are allowed, so trait objects can act as base types:
///
/// ```
/// use poly_tag::TypeKey;
///
/// trait Shape {}
///
/// let base = TypeKey::of::<dyn Shape>();
/// assert_eq!(base.name(), "Shape");
/// ```
///
/// Equality and hashing rely on the [`TypeId`] only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    path: &'static str,
    name: &'static str,
}

impl TypeKey {
    /// Creates the key of a type.
    ///
    /// # Example
    ///
    /// ```
    /// # use poly_tag::TypeKey;
    /// let key = TypeKey::of::<String>();
    /// assert_eq!(key.name(), "String");
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        let path = type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            path,
            name: short_name(path),
        }
    }

    /// Returns the [`TypeId`] of the type.
    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type path, e.g. `alloc::string::String`.
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the short type name, e.g. `String`.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Check if the given type matches this key.
    ///
    /// This only compares the [`TypeId`] of the types.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        TypeId::of::<T>() == self.id
    }
}

/// This implementation purely relies on the [`TypeId`].
impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

/// This implementation purely relies on the [`TypeId`].
impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeKey").field("path", &self.path).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path)
    }
}

/// Strips module segments (and a leading `dyn`) up to the first generic
/// bracket, leaving the short name.
fn short_name(path: &'static str) -> &'static str {
    let end = path.find('<').unwrap_or(path.len());
    match path[..end].rfind("::") {
        Some(idx) => &path[idx + 2..],
        None => path.trim_start_matches("dyn "),
    }
}

// -----------------------------------------------------------------------------
// TagValue

/// A borrowed runtime value that can be tagged.
///
/// Blanket-implemented for every `'static` type, so any value reference
/// coerces to `&dyn TagValue`. Custom id resolvers can inspect the value
/// itself through [`as_any`](TagValue::as_any).
pub trait TagValue: Any {
    /// The key of the value's runtime type.
    fn type_key(&self) -> TypeKey;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> TagValue for T {
    #[inline]
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::TypeKey;

    trait Marker {}

    struct Plain;

    #[test]
    fn short_names() {
        assert_eq!(TypeKey::of::<String>().name(), "String");
        assert_eq!(TypeKey::of::<Plain>().name(), "Plain");
        assert_eq!(TypeKey::of::<dyn Marker>().name(), "Marker");
    }

    #[test]
    fn identity_by_type_id() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<i32>());
        assert!(TypeKey::of::<dyn Marker>().is::<dyn Marker>());
    }
}
