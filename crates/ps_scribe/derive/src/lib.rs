//! See [`Scribe`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static SCRIBE_ATTRIBUTE_NAME: &str = "scribe";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Derive `Scribe`
///
/// `#[derive(Scribe)]` implements `Scribe` and `LoadNew` for a struct with
/// named fields or a unit struct. Every field is written as a named field of
/// the struct's node, in declaration order. `LoadNew` starts from
/// `Default::default()` and loads in place, so the type must implement
/// `Default`.
///
/// Non-generic types also get a `Pointee` implementation, which makes them
/// usable behind `Arc`, `Rc` and `Box`.
///
/// ## Type attributes
///
/// - `#[scribe(tag = "Circle")]`: the type tag written in the `"type"` field.
///   The type is registered for the JSON archives (with the `auto_register`
///   feature) and can be read back through pointers.
/// - `#[scribe(base(dyn Shape))]`: values of this type may be read through
///   pointers to `dyn Shape`. Repeatable. The type must implement `Shape`, and
///   `dyn Shape` must be declared with `declare_base!`.
/// - `#[scribe(polymorphic)]`: written with a `"type"` field but without a
///   tag of its own. Such values are written with the `"unknown"` tag.
/// - `#[scribe(crate = "path::to::scribe")]`: where to find `ps_scribe`.
///   Usually found from `Cargo.toml`.
///
/// ```rust, ignore
/// #[derive(Scribe, Default)]
/// #[scribe(tag = "Circle", base(dyn Shape))]
/// struct Circle {
///     radius: f64,
/// }
/// ```
///
/// ## Field attributes
///
/// - `#[scribe(rename = "r")]`: the field name used in the document.
/// - `#[scribe(optional)]`: reading leaves the field untouched when it is
///   absent from the document.
/// - `#[scribe(skip)]`: never written or read; keeps its `Default` value.
/// - `#[scribe(flatten)]`: the field's own fields are written into the
///   struct's node rather than a nested node. Only for struct fields:
///   sequences, maps, `Option`, strings and primitives cannot be flattened.
///
/// Types with a `"type"` field (tagged, polymorphic or with a base) cannot
/// have a field named `type`.
///
/// ```rust, ignore
/// #[derive(Scribe, Default)]
/// struct Settings {
///     #[scribe(rename = "w")]
///     width: u32,
///     #[scribe(optional)]
///     title: Option<String>,
///     #[scribe(skip)]
///     dirty: bool,
///     #[scribe(flatten)]
///     common: Common,
/// }
/// ```
///
/// ## Generic types
///
/// Generic structs get `Scribe` and `LoadNew` with a `Scribe` bound on every
/// field type, but no `Pointee` implementation and no registration.
#[proc_macro_derive(Scribe, attributes(scribe))]
pub fn derive_scribe(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impls::derive_scribe(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
