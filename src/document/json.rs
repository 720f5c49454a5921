//! `serde_json` backed document adapter.
//!
//! [`JsonWriter`] implements [`DocumentWriter`] by assembling a
//! [`serde_json::Value`] tree, and the `split_tagged` functions perform
//! the read-side counterpart of the tag protocol: pulling a type id out
//! of a tagged document and resolving it to a [`TypeKey`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::{error, fmt};

use serde_json::{Map, Value};

use crate::document::DocumentWriter;
use crate::error::UnresolvedTypeError;
use crate::key::TypeKey;
use crate::registry::Inclusion;
use crate::tag::{CONTENT_PROPERTY, DEFAULT_TAG_PROPERTY, TypeTagReader};

// -----------------------------------------------------------------------------
// JsonWriteError

/// A structural misuse of [`JsonWriter`].
///
/// The tag writer never produces these on its own; they surface when the
/// caller's value tokens do not fit the scopes the prefix opened.
#[derive(Debug, PartialEq, Eq)]
pub enum JsonWriteError {
    /// A value was written inside an object without a preceding key.
    MissingKey,
    /// A key was written outside an object scope, or twice in a row.
    MisplacedKey,
    /// A close token did not match the innermost open scope.
    UnbalancedClose,
    /// A second root value was written after the document completed.
    RootComplete,
    /// An object scope was closed while a key was still pending.
    DanglingKey,
    /// The document ended with open scopes or without a root value.
    Incomplete,
}

impl fmt::Display for JsonWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey => f.pad("value written inside an object without a key"),
            Self::MisplacedKey => f.pad("key written outside an object scope"),
            Self::UnbalancedClose => f.pad("close token does not match the open scope"),
            Self::RootComplete => f.pad("document already holds a root value"),
            Self::DanglingKey => f.pad("object closed while a key was pending"),
            Self::Incomplete => f.pad("document is incomplete"),
        }
    }
}

impl error::Error for JsonWriteError {}

// -----------------------------------------------------------------------------
// JsonWriter

enum Frame {
    Object {
        map: Map<String, Value>,
        key_in_parent: Option<String>,
    },
    Array {
        items: Vec<Value>,
        key_in_parent: Option<String>,
    },
}

/// A [`DocumentWriter`] assembling a [`serde_json::Value`].
///
/// # Example
///
/// ```
/// use poly_tag::document::DocumentWriter;
/// use poly_tag::document::json::JsonWriter;
/// use serde_json::json;
///
/// let mut w = JsonWriter::new();
/// w.start_object().unwrap();
/// w.key("kind").unwrap();
/// w.string("circle").unwrap();
/// w.end_object().unwrap();
///
/// assert_eq!(w.finish().unwrap(), json!({ "kind": "circle" }));
/// ```
pub struct JsonWriter {
    stack: Vec<Frame>,
    pending_key: Option<String>,
    root: Option<Value>,
}

impl JsonWriter {
    /// Creates a writer with no content.
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            pending_key: None,
            root: None,
        }
    }

    /// Writes an arbitrary value at the current position.
    ///
    /// This is how a caller splices a value's own (already mapped)
    /// content between a tag prefix and suffix.
    pub fn value(&mut self, value: Value) -> Result<(), JsonWriteError> {
        match self.stack.last_mut() {
            Some(Frame::Object { map, .. }) => match self.pending_key.take() {
                Some(key) => {
                    map.insert(key, value);
                    Ok(())
                }
                None => Err(JsonWriteError::MissingKey),
            },
            Some(Frame::Array { items, .. }) => {
                items.push(value);
                Ok(())
            }
            None => {
                if self.root.is_some() {
                    return Err(JsonWriteError::RootComplete);
                }
                self.root = Some(value);
                Ok(())
            }
        }
    }

    /// Writes every member of `map` into the currently open object.
    pub fn members(&mut self, map: Map<String, Value>) -> Result<(), JsonWriteError> {
        for (key, value) in map {
            self.key(&key)?;
            self.value(value)?;
        }
        Ok(())
    }

    /// Finishes the document, returning the assembled root value.
    pub fn finish(self) -> Result<Value, JsonWriteError> {
        if !self.stack.is_empty() || self.pending_key.is_some() {
            return Err(JsonWriteError::Incomplete);
        }
        self.root.ok_or(JsonWriteError::Incomplete)
    }

    fn open(&mut self, frame: fn(Option<String>) -> Frame) -> Result<(), JsonWriteError> {
        let key_in_parent = match self.stack.last() {
            Some(Frame::Object { .. }) => match self.pending_key.take() {
                Some(key) => Some(key),
                None => return Err(JsonWriteError::MissingKey),
            },
            Some(Frame::Array { .. }) => None,
            None => {
                if self.root.is_some() {
                    return Err(JsonWriteError::RootComplete);
                }
                None
            }
        };
        self.stack.push(frame(key_in_parent));
        Ok(())
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWriter for JsonWriter {
    type Error = JsonWriteError;

    fn start_object(&mut self) -> Result<(), Self::Error> {
        self.open(|key_in_parent| Frame::Object {
            map: Map::new(),
            key_in_parent,
        })
    }

    fn end_object(&mut self) -> Result<(), Self::Error> {
        if self.pending_key.is_some() {
            return Err(JsonWriteError::DanglingKey);
        }
        match self.stack.pop() {
            Some(Frame::Object { map, key_in_parent }) => {
                self.pending_key = key_in_parent;
                self.value(Value::Object(map))
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(JsonWriteError::UnbalancedClose)
            }
            None => Err(JsonWriteError::UnbalancedClose),
        }
    }

    fn start_array(&mut self) -> Result<(), Self::Error> {
        self.open(|key_in_parent| Frame::Array {
            items: Vec::new(),
            key_in_parent,
        })
    }

    fn end_array(&mut self) -> Result<(), Self::Error> {
        match self.stack.pop() {
            Some(Frame::Array {
                items,
                key_in_parent,
            }) => {
                self.pending_key = key_in_parent;
                self.value(Value::Array(items))
            }
            Some(frame) => {
                self.stack.push(frame);
                Err(JsonWriteError::UnbalancedClose)
            }
            None => Err(JsonWriteError::UnbalancedClose),
        }
    }

    fn key(&mut self, name: &str) -> Result<(), Self::Error> {
        match self.stack.last() {
            Some(Frame::Object { .. }) if self.pending_key.is_none() => {
                self.pending_key = Some(name.to_string());
                Ok(())
            }
            _ => Err(JsonWriteError::MisplacedKey),
        }
    }

    fn string(&mut self, value: &str) -> Result<(), Self::Error> {
        self.value(Value::String(value.to_string()))
    }
}

// -----------------------------------------------------------------------------
// TagReadError

/// An error splitting a tagged document into type id and payload.
#[derive(Debug)]
pub enum TagReadError {
    /// The document's structure does not fit the configured inclusion.
    ShapeMismatch {
        inclusion: Inclusion,
        expected: &'static str,
    },
    /// No id was present and no default implementation is configured.
    MissingId { property: String },
    /// Parent-property tags live in the enclosing object; use
    /// [`split_tagged_in_parent`].
    NeedsParentContext,
    /// The id did not resolve to a known subtype.
    Unresolved(UnresolvedTypeError),
}

impl fmt::Display for TagReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                inclusion,
                expected,
            } => {
                write!(f, "expected {expected} for {inclusion} tag inclusion")
            }
            Self::MissingId { property } => {
                write!(f, "no type id found under property `{property}`")
            }
            Self::NeedsParentContext => {
                f.pad("parent-property tags must be read from the enclosing object")
            }
            Self::Unresolved(inner) => inner.fmt(f),
        }
    }
}

impl error::Error for TagReadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Unresolved(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<UnresolvedTypeError> for TagReadError {
    fn from(value: UnresolvedTypeError) -> Self {
        Self::Unresolved(value)
    }
}

// -----------------------------------------------------------------------------
// Tag extraction

/// Splits a tagged document into the resolved runtime type and the
/// value's own payload, honoring the reader's inclusion strategy.
///
/// The payload is what the value mapping machinery decodes afterwards:
///
/// - `WrapperArray`: the second element of the wrapper array.
/// - `WrapperObject`: the single member's value; the member key is the id.
/// - `MetadataProperty`: the object without the id property. Values that
///   were written as scalars or arrays sit under
///   [`CONTENT_PROPERTY`](crate::tag::CONTENT_PROPERTY) inside it.
/// - `PayloadProperty`: the object unchanged; the id stays in place as a
///   regular member.
/// - `ParentProperty`: not available here; the id is a sibling of the
///   value, so use [`split_tagged_in_parent`].
pub fn split_tagged(
    reader: &TypeTagReader,
    doc: &Value,
) -> Result<(TypeKey, Value), TagReadError> {
    match reader.inclusion() {
        Inclusion::WrapperArray => {
            let items = doc.as_array().ok_or(TagReadError::ShapeMismatch {
                inclusion: Inclusion::WrapperArray,
                expected: "a two element array",
            })?;
            let id = items.first().and_then(Value::as_str).ok_or_else(|| {
                TagReadError::ShapeMismatch {
                    inclusion: Inclusion::WrapperArray,
                    expected: "a leading string id",
                }
            })?;
            let payload = items.get(1).cloned().unwrap_or(Value::Null);
            Ok((reader.resolve_id(id)?, payload))
        }
        Inclusion::WrapperObject => {
            let map = doc.as_object().ok_or(TagReadError::ShapeMismatch {
                inclusion: Inclusion::WrapperObject,
                expected: "a single member object",
            })?;
            let mut entries = map.iter();
            match (entries.next(), entries.next()) {
                (Some((id, payload)), None) => Ok((reader.resolve_id(id)?, payload.clone())),
                _ => Err(TagReadError::ShapeMismatch {
                    inclusion: Inclusion::WrapperObject,
                    expected: "a single member object",
                }),
            }
        }
        Inclusion::MetadataProperty => {
            let property = reader.property_name().unwrap_or(DEFAULT_TAG_PROPERTY);
            let map = doc.as_object().ok_or(TagReadError::ShapeMismatch {
                inclusion: Inclusion::MetadataProperty,
                expected: "an object carrying the id property",
            })?;
            let mut remaining = map.clone();
            match remaining.shift_remove(property).as_ref().and_then(Value::as_str) {
                Some(id) => Ok((reader.resolve_id(id)?, Value::Object(remaining))),
                None => match reader.default_impl() {
                    Some(key) => Ok((key, Value::Object(remaining))),
                    None => Err(TagReadError::MissingId {
                        property: property.to_string(),
                    }),
                },
            }
        }
        Inclusion::PayloadProperty => {
            let property = reader.property_name().unwrap_or(DEFAULT_TAG_PROPERTY);
            let map = doc.as_object().ok_or(TagReadError::ShapeMismatch {
                inclusion: Inclusion::PayloadProperty,
                expected: "an object carrying the id property",
            })?;
            match map.get(property).and_then(Value::as_str) {
                Some(id) => Ok((reader.resolve_id(id)?, doc.clone())),
                None => match reader.default_impl() {
                    Some(key) => Ok((key, doc.clone())),
                    None => Err(TagReadError::MissingId {
                        property: property.to_string(),
                    }),
                },
            }
        }
        Inclusion::ParentProperty => Err(TagReadError::NeedsParentContext),
    }
}

/// Reads a parent-property tag: the id is a sibling member of the value
/// inside `parent`, and the value itself sits under `value_property`.
pub fn split_tagged_in_parent(
    reader: &TypeTagReader,
    parent: &Value,
    value_property: &str,
) -> Result<(TypeKey, Value), TagReadError> {
    let property = reader.property_name().unwrap_or(DEFAULT_TAG_PROPERTY);
    let map = parent.as_object().ok_or(TagReadError::ShapeMismatch {
        inclusion: Inclusion::ParentProperty,
        expected: "an enclosing object",
    })?;
    let payload = map.get(value_property).cloned().unwrap_or(Value::Null);
    match map.get(property).and_then(Value::as_str) {
        Some(id) => Ok((reader.resolve_id(id)?, payload)),
        None => match reader.default_impl() {
            Some(key) => Ok((key, payload)),
            None => Err(TagReadError::MissingId {
                property: property.to_string(),
            }),
        },
    }
}

/// Unwraps the synthetic content member that property-based inclusions
/// add around scalar and array shaped values.
pub fn unwrap_content(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.len() == 1 => {
            match map.shift_remove(CONTENT_PROPERTY) {
                Some(inner) => inner,
                None => Value::Object(map),
            }
        }
        other => other,
    }
}

// -----------------------------------------------------------------------------
// Tests
