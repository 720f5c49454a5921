use alloc::borrow::Cow;
use alloc::sync::Arc;

use crate::context::PropertyContext;
use crate::document::{DocScope, DocumentWriter};
use crate::id::TypeIdResolver;
use crate::key::{TagValue, TypeKey};
use crate::registry::Inclusion;

use super::descriptor::{TagDescriptor, TagShape};
use super::{CONTENT_PROPERTY, DEFAULT_TAG_PROPERTY};

// -----------------------------------------------------------------------------
// TypeTagWriter

/// Embeds type identifiers around polymorphic values.
///
/// A writer is immutable once resolved and bound to exactly one
/// [`Inclusion`], one tag property name (where applicable) and one id
/// resolver; cloning shares the resolver. It is safe for unsynchronized
/// concurrent use — all per-operation state lives in the
/// [`TagDescriptor`].
///
/// The protocol: build a descriptor with [`tag`](Self::tag), pass it to
/// [`write_prefix`](Self::write_prefix), write the value's own member or
/// element tokens, then hand the *returned* descriptor to
/// [`write_suffix`](Self::write_suffix). The prefix opens the value's own
/// object/array scope along with any tag wrapper, and the suffix closes
/// exactly what the prefix recorded as opened.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use poly_tag::TypeKey;
/// use poly_tag::document::json::JsonWriter;
/// use poly_tag::id::LogicalNameIdResolver;
/// use poly_tag::registry::{Inclusion, NamedSubtype, SubtypeSet};
/// use poly_tag::tag::{TagShape, TypeTagWriter};
/// use serde_json::json;
///
/// trait Shape {}
/// struct Circle;
///
/// let subtypes: SubtypeSet = [NamedSubtype::named::<Circle>("circle")].into_iter().collect();
/// let resolver = LogicalNameIdResolver::new(TypeKey::of::<dyn Shape>(), &subtypes).unwrap();
/// let writer = TypeTagWriter::new(Inclusion::WrapperObject, None, Arc::new(resolver));
///
/// let circle = Circle;
/// let mut out = JsonWriter::new();
/// let tag = writer.write_prefix(&mut out, writer.tag(&circle, TagShape::Object)).unwrap();
/// // ... the value's own members would be written here ...
/// writer.write_suffix(&mut out, tag).unwrap();
///
/// assert_eq!(out.finish().unwrap(), json!({ "circle": {} }));
/// ```
#[derive(Clone)]
pub struct TypeTagWriter {
    inclusion: Inclusion,
    property: Option<Cow<'static, str>>,
    id_resolver: Arc<dyn TypeIdResolver>,
}

impl core::fmt::Debug for TypeTagWriter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeTagWriter")
            .field("inclusion", &self.inclusion)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

impl TypeTagWriter {
    /// Binds a writer to an inclusion strategy, a tag property name and
    /// an id resolver.
    ///
    /// Usually constructed by
    /// [`TagResolver`](crate::resolver::TagResolver) rather than by hand;
    /// custom resolver builders use this directly.
    pub fn new(
        inclusion: Inclusion,
        property: Option<Cow<'static, str>>,
        id_resolver: Arc<dyn TypeIdResolver>,
    ) -> Self {
        Self {
            inclusion,
            property,
            id_resolver,
        }
    }

    /// Specializes the writer for values of one property.
    ///
    /// A pure function of the context: a per-property tag name override
    /// rebinds the property name, anything else yields an identical
    /// writer. No state is shared mutably with the original.
    pub fn for_property(&self, context: &PropertyContext) -> Self {
        match context.tag_property() {
            Some(property) if self.inclusion.requires_property() => Self {
                inclusion: self.inclusion,
                property: Some(Cow::Borrowed(property)),
                id_resolver: Arc::clone(&self.id_resolver),
            },
            _ => self.clone(),
        }
    }

    /// The inclusion strategy this writer embeds tags with.
    #[inline(always)]
    pub const fn inclusion(&self) -> Inclusion {
        self.inclusion
    }

    /// The tag property name, for property-based inclusions.
    #[inline]
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The id resolver this writer computes tags with.
    #[inline]
    pub fn id_resolver(&self) -> &Arc<dyn TypeIdResolver> {
        &self.id_resolver
    }

    // -- descriptor construction ----------------------------------------------

    /// Builds the descriptor for one value write. The id stays unset
    /// until the prefix call computes it.
    pub fn tag<'a>(&self, value: &'a dyn TagValue, shape: TagShape) -> TagDescriptor<'a> {
        TagDescriptor::new(value, shape, self.inclusion, self.property.clone())
    }

    /// Builds a descriptor with a pre-computed id.
    pub fn tag_with_id<'a>(
        &self,
        value: &'a dyn TagValue,
        shape: TagShape,
        id: impl Into<Cow<'static, str>>,
    ) -> TagDescriptor<'a> {
        let mut tag = self.tag(value, shape);
        tag.set_id(id.into());
        tag
    }

    /// Builds a descriptor whose id is computed from `key` instead of the
    /// value's runtime type (typically a supertype of it).
    pub fn tag_for_type<'a>(
        &self,
        value: &'a dyn TagValue,
        shape: TagShape,
        key: TypeKey,
    ) -> TagDescriptor<'a> {
        let mut tag = self.tag(value, shape);
        tag.set_key_override(key);
        tag
    }

    // -- the tag protocol -----------------------------------------------------

    /// Emits the tokens the inclusion strategy requires ahead of the
    /// value's own tokens, including the value's own opening scope for
    /// object and array shapes.
    ///
    /// Must be called exactly once per value; the returned descriptor
    /// records what was opened and must be the one handed to
    /// [`write_suffix`](Self::write_suffix).
    pub fn write_prefix<'a, W: DocumentWriter>(
        &self,
        out: &mut W,
        mut tag: TagDescriptor<'a>,
    ) -> Result<TagDescriptor<'a>, W::Error> {
        if tag.id().is_none() {
            let id = if tag.has_key_override() {
                self.id_resolver.id_for_type(&tag.key_for_id())
            } else {
                self.id_resolver.id_for_value(tag.value())
            };
            tag.set_id(id);
        }
        // Taken right back out; keeps the borrow checker happy while the
        // descriptor is mutated below.
        let id = match tag.id_cow() {
            Some(id) => id.clone(),
            None => Cow::Borrowed(""),
        };
        let property = match tag.property_cow() {
            Some(name) => name.clone(),
            None => Cow::Borrowed(DEFAULT_TAG_PROPERTY),
        };

        match tag.inclusion() {
            Inclusion::WrapperArray => {
                out.start_array()?;
                out.string(&id)?;
                tag.opened.wrapper = Some(DocScope::Array);
            }
            Inclusion::WrapperObject => {
                // The id is the member key itself, not a value under a
                // fixed name.
                out.start_object()?;
                out.key(&id)?;
                tag.opened.wrapper = Some(DocScope::Object);
            }
            Inclusion::MetadataProperty | Inclusion::PayloadProperty => {
                if tag.shape() != TagShape::Object {
                    // Property placement needs an object context; wrap
                    // scalar and array shapes in a synthetic object with
                    // the value under a fixed content member.
                    out.start_object()?;
                    out.key(&property)?;
                    out.string(&id)?;
                    out.key(CONTENT_PROPERTY)?;
                    tag.opened.wrapper = Some(DocScope::Object);
                }
            }
            Inclusion::ParentProperty => {
                // Nothing at the value's position; the id becomes a
                // sibling member, written by the suffix call.
            }
        }

        match tag.shape() {
            TagShape::Object => {
                out.start_object()?;
                tag.opened.value_scope = Some(DocScope::Object);
                if tag.inclusion() == Inclusion::MetadataProperty {
                    // Ahead of the value's own members.
                    out.key(&property)?;
                    out.string(&id)?;
                }
            }
            TagShape::Array => {
                out.start_array()?;
                tag.opened.value_scope = Some(DocScope::Array);
            }
            TagShape::Scalar => {}
        }

        Ok(tag)
    }

    /// Emits the closing tokens matching what
    /// [`write_prefix`](Self::write_prefix) opened, consuming the
    /// descriptor it returned.
    ///
    /// For parent-property inclusion this is also where the id is written,
    /// as a sibling member of the just-closed value in the enclosing
    /// object. An encoding driver that manages sibling placement itself
    /// can instead read the id off the descriptor and position it within
    /// the parent's own member sequence.
    pub fn write_suffix<W: DocumentWriter>(
        &self,
        out: &mut W,
        tag: TagDescriptor<'_>,
    ) -> Result<(), W::Error> {
        match tag.opened.value_scope {
            Some(DocScope::Object) => out.end_object()?,
            Some(DocScope::Array) => out.end_array()?,
            None => {}
        }
        match tag.opened.wrapper {
            Some(DocScope::Object) => out.end_object()?,
            Some(DocScope::Array) => out.end_array()?,
            None => {}
        }
        if tag.inclusion() == Inclusion::ParentProperty {
            if let Some(id) = tag.id() {
                let property = tag.property_name().unwrap_or(DEFAULT_TAG_PROPERTY);
                // Back in the enclosing object now.
                out.key(property)?;
                out.string(id)?;
            }
        }
        Ok(())
    }

    // -- shape-specialized conveniences ---------------------------------------

    /// [`write_prefix`](Self::write_prefix) for an object-shaped value.
    pub fn write_object_prefix<'a, W: DocumentWriter>(
        &self,
        out: &mut W,
        value: &'a dyn TagValue,
    ) -> Result<TagDescriptor<'a>, W::Error> {
        self.write_prefix(out, self.tag(value, TagShape::Object))
    }

    /// [`write_prefix`](Self::write_prefix) for an array-shaped value.
    pub fn write_array_prefix<'a, W: DocumentWriter>(
        &self,
        out: &mut W,
        value: &'a dyn TagValue,
    ) -> Result<TagDescriptor<'a>, W::Error> {
        self.write_prefix(out, self.tag(value, TagShape::Array))
    }

    /// [`write_prefix`](Self::write_prefix) for a scalar-shaped value.
    pub fn write_scalar_prefix<'a, W: DocumentWriter>(
        &self,
        out: &mut W,
        value: &'a dyn TagValue,
    ) -> Result<TagDescriptor<'a>, W::Error> {
        self.write_prefix(out, self.tag(value, TagShape::Scalar))
    }
}
