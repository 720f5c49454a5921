//! Conversion between runtime types and the ids embedded in documents.
//!
//! ## Menu
//!
//! - [`TypeIdResolver`]: the two-way mapping a tag writer/reader is bound to.
//! - [`IdResolverFactory`]: builds a custom resolver for a base type.
//! - Standard resolvers, one per [`IdKind`](crate::registry::IdKind):
//!     - [`TypePathIdResolver`]: full type paths.
//!     - [`TypeNameIdResolver`]: short type names.
//!     - [`LogicalNameIdResolver`]: declared logical names.
//!
//! All standard resolvers resolve ids through the collected subtype set;
//! without runtime reflection there is no way to conjure a type out of a
//! string, so read-back only reaches registered types.

// -----------------------------------------------------------------------------
// Modules

mod standard;

pub use standard::{LogicalNameIdResolver, TypeNameIdResolver, TypePathIdResolver};

// -----------------------------------------------------------------------------
// TypeIdResolver

use alloc::borrow::Cow;
use alloc::sync::Arc;

use crate::error::ConfigError;
use crate::key::{TagValue, TypeKey};
use crate::registry::{IdKind, SubtypeSet};

/// Two-way mapping between runtime types and embedded type ids.
///
/// Implementations are immutable and shared behind an [`Arc`] by every
/// writer and reader produced from one resolution.
pub trait TypeIdResolver: Send + Sync {
    /// The mechanism this resolver implements.
    fn id_kind(&self) -> IdKind;

    /// Computes the id for a runtime value.
    ///
    /// The default delegates to [`id_for_type`](Self::id_for_type) with
    /// the value's runtime type; custom resolvers may inspect the value
    /// itself.
    fn id_for_value(&self, value: &dyn TagValue) -> Cow<'static, str> {
        self.id_for_type(&value.type_key())
    }

    /// Computes the id for a type.
    fn id_for_type(&self, key: &TypeKey) -> Cow<'static, str>;

    /// Maps an id read from a document back to a type, if known.
    fn resolve_id(&self, id: &str) -> Option<TypeKey>;
}

// -----------------------------------------------------------------------------
// IdResolverFactory

/// Builds a caller-supplied [`TypeIdResolver`], initialized with the base
/// type and its resolved subtype set.
pub trait IdResolverFactory: Send + Sync {
    fn build(
        &self,
        base: TypeKey,
        subtypes: &SubtypeSet,
    ) -> Result<Arc<dyn TypeIdResolver>, ConfigError>;
}
