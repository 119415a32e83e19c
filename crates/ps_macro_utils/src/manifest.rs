use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The parsed `Cargo.toml` of the crate invoking a derive macro.
///
/// Generated code has to name `ps_scribe` the way the invoking crate sees it,
/// which depends on whether that crate depends on `ps_scribe` directly or only
/// on the `poly_scribe` facade.
///
/// # Example
///
/// ```rust
/// # use ps_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("ps_scribe"));
/// ```
///
/// # Resolution rules
///
/// 1. If the requested crate is listed in `dependencies`, return `::crate_name`.
/// 2. If the requested crate name begins with `ps_` and the invoking crate
///    depends on `poly_scribe`, return `::poly_scribe::short_name`
///    (e.g. `ps_scribe` -> `::poly_scribe::scribe`).
/// 3. Repeat step 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to `::crate_name`.
///
/// A crate that derives on its own types can add `extern crate self as ps_scribe;`
/// so that the fallback path resolves inside the crate too.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Option<Document<Box<str>>>,
    pub modified_time: Option<SystemTime>,
}

const FACADE_NAME: &str = "poly_scribe";
const CRATE_PREFIX: &str = "ps_";

impl Manifest {
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    fn read_manifest(path: &Path) -> Option<Document<Box<str>>> {
        let text = std::fs::read_to_string(path).ok()?.into_boxed_str();
        Document::parse(text).ok()
    }

    fn absolute(segments: &[&str]) -> Option<syn::Path> {
        syn::parse_str(&format!("::{}", segments.join("::"))).ok()
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Self::absolute(&[name]);
        }
        let module = name.strip_prefix(CRATE_PREFIX)?;
        if deps.contains_key(FACADE_NAME) {
            return Self::absolute(&[FACADE_NAME, module]);
        }
        None
    }

    /// Return a [`syn::Path`] for the package named `name` as seen from the
    /// invoking crate. See the type-level documentation for the rules.
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        let found = self.manifest.as_ref().and_then(|manifest| {
            ["dependencies", "dev-dependencies"]
                .into_iter()
                .find_map(|table| match manifest.get(table) {
                    Some(Item::Table(deps)) => Self::find_in_deps(deps, name),
                    _ => None,
                })
        });

        found
            .or_else(|| Self::absolute(&[name]))
            .unwrap_or_else(|| syn::parse_quote!(::ps_scribe))
    }

    /// Run `func` with the [`Manifest`] of the invoking crate.
    ///
    /// Manifests are cached per path and re-read when the file's modification
    /// time changes. A missing or unreadable manifest yields the fallback paths.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let Some(path) = Self::manifest_path() else {
            return func(&Manifest {
                manifest: None,
                modified_time: None,
            });
        };
        let modified_time = std::fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok();

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read_manifest(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}
