use alloc::borrow::Cow;

use crate::error::ConfigError;
use crate::hash::{HashMap, TypeIdMap};
use crate::key::TypeKey;
use crate::registry::{IdKind, SubtypeSet};

use super::TypeIdResolver;

// -----------------------------------------------------------------------------
// TypePathIdResolver

/// Ids are full type paths.
///
/// Read-back resolves through the subtype set (plus the base type itself);
/// unknown paths stay unresolved.
pub struct TypePathIdResolver {
    by_path: HashMap<&'static str, TypeKey>,
}

impl TypePathIdResolver {
    pub fn new(base: TypeKey, subtypes: &SubtypeSet) -> Self {
        let mut by_path = HashMap::default();
        by_path.insert(base.path(), base);
        for subtype in subtypes.iter() {
            by_path.insert(subtype.key().path(), subtype.key());
        }
        Self { by_path }
    }
}

impl TypeIdResolver for TypePathIdResolver {
    fn id_kind(&self) -> IdKind {
        IdKind::TypePath
    }

    fn id_for_type(&self, key: &TypeKey) -> Cow<'static, str> {
        Cow::Borrowed(key.path())
    }

    fn resolve_id(&self, id: &str) -> Option<TypeKey> {
        self.by_path.get(id).copied()
    }
}

// -----------------------------------------------------------------------------
// TypeNameIdResolver

/// Ids are short type names.
pub struct TypeNameIdResolver {
    by_name: HashMap<&'static str, TypeKey>,
}

impl TypeNameIdResolver {
    pub fn new(base: TypeKey, subtypes: &SubtypeSet) -> Self {
        let mut by_name = HashMap::default();
        by_name.insert(base.name(), base);
        for subtype in subtypes.iter() {
            by_name.insert(subtype.key().name(), subtype.key());
        }
        Self { by_name }
    }
}

impl TypeIdResolver for TypeNameIdResolver {
    fn id_kind(&self) -> IdKind {
        IdKind::TypeName
    }

    fn id_for_type(&self, key: &TypeKey) -> Cow<'static, str> {
        Cow::Borrowed(key.name())
    }

    fn resolve_id(&self, id: &str) -> Option<TypeKey> {
        self.by_name.get(id).copied()
    }
}

// -----------------------------------------------------------------------------
// LogicalNameIdResolver

/// Ids are the logical names of the declared subtype set.
///
/// Construction fails when two subtypes resolve to the same name; this is
/// where the uniqueness invariant of the set is enforced. Types outside
/// the set fall back to their short type name on write, so a forgotten
/// registration shows up as an unresolvable id on read rather than a
/// write-time panic.
#[derive(Debug)]
pub struct LogicalNameIdResolver {
    to_id: TypeIdMap<&'static str>,
    to_key: HashMap<&'static str, TypeKey>,
}

impl LogicalNameIdResolver {
    pub fn new(base: TypeKey, subtypes: &SubtypeSet) -> Result<Self, ConfigError> {
        let mut to_id = TypeIdMap::default();
        let mut to_key: HashMap<&'static str, TypeKey> = HashMap::default();
        for subtype in subtypes.iter() {
            let name = subtype.name();
            if let Some(first) = to_key.get(name) {
                if *first != subtype.key() {
                    return Err(ConfigError::DuplicateSubtypeName {
                        base: Cow::Borrowed(base.path()),
                        name: Cow::Borrowed(name),
                        first: Cow::Borrowed(first.path()),
                        second: Cow::Borrowed(subtype.key().path()),
                    });
                }
                continue;
            }
            to_id.insert(subtype.key().id(), name);
            to_key.insert(name, subtype.key());
        }
        Ok(Self { to_id, to_key })
    }
}

impl TypeIdResolver for LogicalNameIdResolver {
    fn id_kind(&self) -> IdKind {
        IdKind::Logical
    }

    fn id_for_type(&self, key: &TypeKey) -> Cow<'static, str> {
        match self.to_id.get(&key.id()) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Borrowed(key.name()),
        }
    }

    fn resolve_id(&self, id: &str) -> Option<TypeKey> {
        self.to_key.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{LogicalNameIdResolver, TypeIdResolver, TypeNameIdResolver, TypePathIdResolver};
    use crate::error::ConfigError;
    use crate::key::TypeKey;
    use crate::registry::{NamedSubtype, SubtypeSet};

    trait Shape {}
    struct Circle;
    struct Square;

    fn shapes() -> SubtypeSet {
        [
            NamedSubtype::named::<Circle>("circle"),
            NamedSubtype::named::<Square>("square"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn logical_names_round_trip() {
        let resolver =
            LogicalNameIdResolver::new(TypeKey::of::<dyn Shape>(), &shapes()).unwrap();

        assert_eq!(resolver.id_for_type(&TypeKey::of::<Circle>()), "circle");
        assert_eq!(
            resolver.resolve_id("square").unwrap(),
            TypeKey::of::<Square>()
        );
        assert!(resolver.resolve_id("triangle").is_none());
    }

    #[test]
    fn unregistered_type_falls_back_to_short_name() {
        struct Hexagon;
        let resolver =
            LogicalNameIdResolver::new(TypeKey::of::<dyn Shape>(), &shapes()).unwrap();
        assert_eq!(resolver.id_for_type(&TypeKey::of::<Hexagon>()), "Hexagon");
    }

    #[test]
    fn duplicate_logical_names_are_rejected() {
        let set: SubtypeSet = [
            NamedSubtype::named::<Circle>("shape"),
            NamedSubtype::named::<Square>("shape"),
        ]
        .into_iter()
        .collect();

        let err = LogicalNameIdResolver::new(TypeKey::of::<dyn Shape>(), &set).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateSubtypeName { name, .. } if name == "shape"
        ));
    }

    #[test]
    fn path_and_name_resolvers_cover_the_set() {
        let base = TypeKey::of::<dyn Shape>();
        let paths = TypePathIdResolver::new(base, &shapes());
        let names = TypeNameIdResolver::new(base, &shapes());

        let circle = TypeKey::of::<Circle>();
        assert_eq!(paths.resolve_id(&paths.id_for_type(&circle)), Some(circle));
        assert_eq!(names.resolve_id(&names.id_for_type(&circle)), Some(circle));
    }
}
