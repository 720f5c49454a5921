use alloc::borrow::Cow;
use alloc::string::String;
use core::{error, fmt};

// -----------------------------------------------------------------------------
// ConfigError

/// An enumeration of everything that can go wrong while turning declared
/// polymorphism metadata into a concrete tag writer or reader.
///
/// These are configuration faults: resolution is deterministic, so every
/// variant points at a declaration that has to change, not at a transient
/// condition.
#[derive(Debug)]
pub enum ConfigError {
    /// Two subtypes of one base resolved to the same logical name.
    DuplicateSubtypeName {
        base: Cow<'static, str>,
        name: Cow<'static, str>,
        first: Cow<'static, str>,
        second: Cow<'static, str>,
    },
    /// A context declares both metadata and an opt-out, or was declared twice.
    ConflictingDeclarations { context: Cow<'static, str> },
    /// Metadata asks for a custom id mechanism but no resolver was supplied.
    MissingIdResolver { base: Cow<'static, str> },
    /// A property-based inclusion without an explicit or derivable name.
    MissingPropertyName { base: Cow<'static, str> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSubtypeName {
                base,
                name,
                first,
                second,
            } => {
                write!(
                    f,
                    "subtypes `{first}` and `{second}` of `{base}` share the logical name `{name}`"
                )
            }
            Self::ConflictingDeclarations { context } => {
                write!(f, "conflicting tag declarations for context `{context}`")
            }
            Self::MissingIdResolver { base } => {
                write!(
                    f,
                    "type `{base}` declares a custom id mechanism but no id resolver was registered"
                )
            }
            Self::MissingPropertyName { base } => {
                write!(
                    f,
                    "type `{base}` uses property inclusion but no property name could be derived"
                )
            }
        }
    }
}

impl error::Error for ConfigError {}

// -----------------------------------------------------------------------------
// UnresolvedTypeError

/// A type id found in a document matched no entry of the resolved subtype
/// set, and no default implementation was configured.
///
/// Recoverable by caller policy (skip the value, substitute a fallback,
/// or abort the read).
#[derive(Debug)]
pub struct UnresolvedTypeError {
    /// The id as it appeared in the document.
    pub id: String,
    /// Path of the base type the read was declared against.
    pub base: &'static str,
}

impl fmt::Display for UnresolvedTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type id `{}` does not match any known subtype of `{}`",
            self.id, self.base
        )
    }
}

impl error::Error for UnresolvedTypeError {}
