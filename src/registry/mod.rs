//! The declared polymorphism configuration and its registration API.
//!
//! ## Menu
//!
//! - [`PolyMeta`]: per base type metadata — [`Inclusion`] strategy,
//!   [`IdKind`] mechanism, optional property name and default
//!   implementation.
//! - [`NamedSubtype`] / [`SubtypeSet`]: declared subtype relationships
//!   with logical names.
//! - [`PolyRegistry`]: the startup-time registration store and the lookup
//!   collaborator consumed during resolution.
//! - [`PolyRegistryArc`]: a shared lock-guarded registry handle
//!   (**std** feature).
//! - [`SubtypeRegistration`] and the
//!   [`register_subtypes!`](crate::register_subtypes) macro: static
//!   subtype declaration (**auto_register** feature).
//!
//! ## auto_register
//!
//! We use the `inventory` crate to implement static registration; not
//! all platforms support it (although major platforms do). Where it is
//! unsupported, [`PolyRegistry::auto_register`] simply collects nothing.

// -----------------------------------------------------------------------------
// Modules

mod metadata;
mod registry;
mod subtypes;

// -----------------------------------------------------------------------------
// Exports

pub use metadata::{IdKind, Inclusion, PolyMeta};
pub use registry::{ContextKey, PolyRegistry};
pub use subtypes::{NamedSubtype, SubtypeSet};

#[cfg(feature = "std")]
pub use registry::PolyRegistryArc;

#[cfg(feature = "auto_register")]
pub use registry::SubtypeRegistration;
