use alloc::vec::Vec;

use crate::key::TypeKey;

// -----------------------------------------------------------------------------
// NamedSubtype

/// One declared subtype of a base type, with an optional logical name.
///
/// A subtype without an explicit name falls back to its short type name,
/// deterministically.
#[derive(Clone, Copy, Debug)]
pub struct NamedSubtype {
    key: TypeKey,
    name: Option<&'static str>,
}

impl NamedSubtype {
    /// A subtype without an explicit logical name.
    pub fn of<T: 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            name: None,
        }
    }

    /// A subtype with an explicit logical name.
    pub fn named<T: 'static>(name: &'static str) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            name: Some(name),
        }
    }

    /// Builds an entry from an already computed key.
    pub const fn from_key(key: TypeKey, name: Option<&'static str>) -> Self {
        Self { key, name }
    }

    /// The subtype's key.
    #[inline(always)]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// The explicit logical name, if one was declared.
    #[inline(always)]
    pub const fn explicit_name(&self) -> Option<&'static str> {
        self.name
    }

    /// The logical name in effect: explicit, or the short type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self.name {
            Some(name) => name,
            None => self.key.name(),
        }
    }
}

// -----------------------------------------------------------------------------
// SubtypeSet

/// The resolved set of subtypes of one base type.
///
/// Order-irrelevant; entries are unique by [`TypeId`](core::any::TypeId)
/// with the first declaration winning. Logical-name uniqueness is *not*
/// checked here; the logical-name id resolver reports duplicates when it
/// is built.
#[derive(Clone, Debug, Default)]
pub struct SubtypeSet {
    entries: Vec<NamedSubtype>,
}

impl SubtypeSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a subtype, ignoring re-declarations of an already present type.
    pub fn insert(&mut self, subtype: NamedSubtype) {
        if !self.contains(subtype.key()) {
            self.entries.push(subtype);
        }
    }

    /// Whether the set holds the given type.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.iter().any(|entry| entry.key() == key)
    }

    /// The number of subtypes in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &NamedSubtype> {
        self.entries.iter()
    }
}

impl FromIterator<NamedSubtype> for SubtypeSet {
    fn from_iter<I: IntoIterator<Item = NamedSubtype>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::{NamedSubtype, SubtypeSet};

    struct Circle;
    struct Square;

    #[test]
    fn first_declaration_wins() {
        let mut set = SubtypeSet::new();
        set.insert(NamedSubtype::named::<Circle>("circle"));
        set.insert(NamedSubtype::of::<Circle>());
        set.insert(NamedSubtype::of::<Square>());

        assert_eq!(set.len(), 2);
        let circle = set.iter().find(|s| s.key().is::<Circle>()).unwrap();
        assert_eq!(circle.name(), "circle");
    }

    #[test]
    fn name_defaults_to_short_type_name() {
        assert_eq!(NamedSubtype::of::<Square>().name(), "Square");
    }
}
