//! The type-tag embedding protocol.
//!
//! ## Menu
//!
//! - [`TagShape`]: the structural shape a value is written as.
//! - [`TagDescriptor`]: the per-operation value object threaded from
//!   prefix to suffix.
//! - [`TypeTagWriter`]: embeds ids around values per the configured
//!   [`Inclusion`](crate::registry::Inclusion).
//! - [`TypeTagReader`]: resolves ids back to types on read-back.
//!
//! Writers and readers are produced by
//! [`TagResolver`](crate::resolver::TagResolver) and bound to one
//! configuration for their whole life.

// -----------------------------------------------------------------------------
// Modules

mod descriptor;
mod reader;
mod writer;

// -----------------------------------------------------------------------------
// Exports

pub use descriptor::{TagDescriptor, TagShape};
pub use reader::TypeTagReader;
pub use writer::TypeTagWriter;

// -----------------------------------------------------------------------------
// Shared constants

/// The fallback tag property name when none is configured.
pub const DEFAULT_TAG_PROPERTY: &str = "@type";

/// The member under which property-based inclusions place scalar and
/// array shaped values inside their synthetic wrapper object.
pub const CONTENT_PROPERTY: &str = "value";
