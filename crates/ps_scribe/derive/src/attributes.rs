//! Parsing of `#[scribe(..)]` attributes.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr, Path, Token, parenthesized};

use crate::SCRIBE_ATTRIBUTE_NAME;

const UNKNOWN_TAG: &str = "unknown";

// -----------------------------------------------------------------------------
// TypeAttributes

/// Attributes placed on the deriving type.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `tag = "Circle"`
    pub tag: Option<LitStr>,
    /// `base(dyn Shape)`, the path after `dyn`.
    pub bases: Vec<Path>,
    /// `polymorphic`
    pub polymorphic: Option<Span>,
    /// `crate = "path"`
    pub krate: Option<Path>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();

        for attr in attrs {
            if !attr.path().is_ident(SCRIBE_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("tag") {
                    if this.tag.is_some() {
                        return Err(meta.error("duplicate `tag`"));
                    }
                    let tag: LitStr = meta.value()?.parse()?;
                    let text = tag.value();
                    if text.is_empty() || text == UNKNOWN_TAG {
                        return Err(syn::Error::new(
                            tag.span(),
                            format!("`{text}` cannot be used as a type tag"),
                        ));
                    }
                    this.tag = Some(tag);
                    Ok(())
                } else if meta.path.is_ident("base") {
                    let content;
                    parenthesized!(content in meta.input);
                    content.parse::<Token![dyn]>()?;
                    this.bases.push(content.parse()?);
                    Ok(())
                } else if meta.path.is_ident("polymorphic") {
                    this.polymorphic = Some(meta.path.span());
                    Ok(())
                } else if meta.path.is_ident("crate") {
                    let path: LitStr = meta.value()?.parse()?;
                    this.krate = Some(path.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown scribe attribute, expected `tag`, `base`, `polymorphic` or `crate`"))
                }
            })?;
        }

        Ok(this)
    }

    /// Whether values are written with a `"type"` field.
    #[inline]
    pub fn is_polymorphic(&self) -> bool {
        self.tag.is_some() || self.polymorphic.is_some() || !self.bases.is_empty()
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Attributes placed on a field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    /// `rename = "name"`
    pub rename: Option<LitStr>,
    /// `optional`
    pub optional: bool,
    /// `skip`
    pub skip: bool,
    /// `flatten`
    pub flatten: bool,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        let mut span = None;

        for attr in attrs {
            if !attr.path().is_ident(SCRIBE_ATTRIBUTE_NAME) {
                continue;
            }
            span.get_or_insert(attr.span());
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    this.rename = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("optional") {
                    this.optional = true;
                } else if meta.path.is_ident("skip") {
                    this.skip = true;
                } else if meta.path.is_ident("flatten") {
                    this.flatten = true;
                } else {
                    return Err(meta.error(
                        "unknown scribe field attribute, expected `rename`, `optional`, `skip` or `flatten`",
                    ));
                }
                Ok(())
            })?;
        }

        if let Some(span) = span {
            this.validity(span)?;
        }
        Ok(this)
    }

    fn validity(&self, span: Span) -> syn::Result<()> {
        if self.skip && (self.rename.is_some() || self.optional || self.flatten) {
            return Err(syn::Error::new(span, "`skip` cannot be combined with other attributes"));
        }
        if self.flatten && (self.rename.is_some() || self.optional) {
            return Err(syn::Error::new(
                span,
                "a flattened field has no name of its own, `rename` and `optional` do not apply",
            ));
        }
        Ok(())
    }
}
