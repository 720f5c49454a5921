//! The document emission seam.
//!
//! This crate never emits raw bytes. All structural tokens go through the
//! [`DocumentWriter`] trait, implemented by whatever backs the actual
//! output format. The [`json`] module ships a `serde_json` backed
//! implementation together with read-side tag extraction.

// -----------------------------------------------------------------------------
// Modules

#[cfg(feature = "json")]
pub mod json;

// -----------------------------------------------------------------------------
// DocScope

/// A structural scope of the document grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocScope {
    /// A key/value object scope.
    Object,
    /// An ordered array scope.
    Array,
}

// -----------------------------------------------------------------------------
// DocumentWriter

/// Token-level access to a document output stream.
///
/// The tag writer emits type identifiers and wrapper scopes through this
/// interface, interleaved with the value's own tokens which the caller
/// writes between the prefix and suffix calls.
///
/// Implementations define what a structural misuse (a key outside an
/// object, an unbalanced close) means through their own `Error` type;
/// the tag writer itself always emits balanced sequences.
pub trait DocumentWriter {
    type Error;

    /// Opens an object scope.
    fn start_object(&mut self) -> Result<(), Self::Error>;

    /// Closes the innermost object scope.
    fn end_object(&mut self) -> Result<(), Self::Error>;

    /// Opens an array scope.
    fn start_array(&mut self) -> Result<(), Self::Error>;

    /// Closes the innermost array scope.
    fn end_array(&mut self) -> Result<(), Self::Error>;

    /// Writes a member key inside an object scope.
    fn key(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Writes a string scalar.
    fn string(&mut self, value: &str) -> Result<(), Self::Error>;
}

impl<W: DocumentWriter + ?Sized> DocumentWriter for &mut W {
    type Error = W::Error;

    #[inline]
    fn start_object(&mut self) -> Result<(), Self::Error> {
        (**self).start_object()
    }

    #[inline]
    fn end_object(&mut self) -> Result<(), Self::Error> {
        (**self).end_object()
    }

    #[inline]
    fn start_array(&mut self) -> Result<(), Self::Error> {
        (**self).start_array()
    }

    #[inline]
    fn end_array(&mut self) -> Result<(), Self::Error> {
        (**self).end_array()
    }

    #[inline]
    fn key(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).key(name)
    }

    #[inline]
    fn string(&mut self, value: &str) -> Result<(), Self::Error> {
        (**self).string(value)
    }
}
