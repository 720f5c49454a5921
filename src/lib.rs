#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod error;
mod hash;
mod key;

pub mod document;
pub mod id;
pub mod registry;
pub mod resolver;
pub mod tag;

// -----------------------------------------------------------------------------
// Macro support

/// Implementation detail of the crate's macros. Not public API.
#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub mod __macro_exports {
    pub use inventory;
}

// -----------------------------------------------------------------------------
// Top-Level exports

pub use context::{PropertyContext, TagContext};
pub use error::{ConfigError, UnresolvedTypeError};
pub use key::{TagValue, TypeKey};
