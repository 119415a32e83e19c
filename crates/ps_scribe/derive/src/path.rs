/// Get the access path to the `ps_scribe` crate.
///
/// 1. For crates that depend on `ps_scribe`, `::ps_scribe` is returned.
/// 2. For crates that depend on `poly_scribe`, `::poly_scribe::scribe` is returned.
/// 3. Otherwise `::ps_scribe` is returned, which may be incorrect; use
///    `#[scribe(crate = "..")]` in that case.
pub(crate) fn ps_scribe() -> syn::Path {
    ps_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("ps_scribe"))
}
