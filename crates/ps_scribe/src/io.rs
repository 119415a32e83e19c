//! Reading and writing whole files.
//!
//! The archive is picked from the file extension. The value passed to
//! [`save`] becomes the root node of the document, and [`load`] builds a
//! value from the root node.
//!
//! | Extension | Archive |
//! |---|---|
//! | `json` | [`JsonOutputArchive`](crate::archive::json::JsonOutputArchive) (pretty) / [`JsonInputArchive`](crate::archive::json::JsonInputArchive) |
//!
//! # Examples
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! let scores = BTreeMap::from([("ada".to_string(), 3_u32)]);
//! ps_scribe::io::save("scores.json", &scores).unwrap();
//!
//! let back: BTreeMap<String, u32> = ps_scribe::io::load("scores.json").unwrap();
//! assert_eq!(back, scores);
//! ```

use std::fs;
use std::path::Path;

use crate::archive::json;
use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// Format

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
}

const EXTENSIONS: &[(&str, Format)] = &[("json", Format::Json)];

fn format_of(path: &Path) -> Result<Format, ScribeError> {
    let extension = path.extension().and_then(|ext| ext.to_str());
    EXTENSIONS
        .iter()
        .find(|(name, _)| extension.is_some_and(|ext| ext.eq_ignore_ascii_case(name)))
        .map(|(_, format)| *format)
        .ok_or_else(|| ScribeError::UnsupportedExtension {
            path: path.to_path_buf(),
        })
}

// -----------------------------------------------------------------------------
// Load / Save

/// Reads a `T` from the file at `path`.
pub fn load<T: LoadNew>(path: impl AsRef<Path>) -> Result<T, ScribeError> {
    let path = path.as_ref();
    if path.is_dir() {
        return Err(ScribeError::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    if !path.exists() {
        return Err(ScribeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match format_of(path)? {
        Format::Json => {
            let text = fs::read_to_string(path)?;
            json::from_str(&text)
        }
    }
}

/// Writes `value` to the file at `path`, replacing its contents.
pub fn save<T: Scribe + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<(), ScribeError> {
    let path = path.as_ref();
    if path.is_dir() {
        return Err(ScribeError::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    match format_of(path)? {
        Format::Json => {
            let text = json::to_string_pretty(value)?;
            fs::write(path, text)?;
        }
    }
    log::debug!("saved `{}`", path.display());
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use std::fs;

    use crate::{Polymorphic, Scribe, ScribeError, declare_base, registry, upcaster};

    trait Note: Polymorphic {
        fn text(&self) -> &str;
    }

    declare_base!(dyn Note);

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "io.Memo", base(dyn Note))]
    struct Memo {
        text: String,
        #[scribe(optional)]
        pinned: bool,
    }

    impl Note for Memo {
        fn text(&self) -> &str {
            &self.text
        }
    }

    #[test]
    fn file_round_trip() {
        registry::register::<Memo>();
        registry::install(upcaster!(dyn Note => Memo));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let notes: Vec<Arc<dyn Note>> = vec![Arc::new(Memo {
            text: "buy milk".into(),
            pinned: true,
        })];

        super::save(&path, &notes).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"type\": \"io.Memo\""));

        let back: Vec<Arc<dyn Note>> = super::load(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].text(), "buy milk");
    }

    #[test]
    fn path_failures() {
        let dir = tempfile::tempdir().unwrap();

        let err = super::load::<u8>(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ScribeError::FileNotFound { .. }));

        let err = super::load::<u8>(dir.path()).unwrap_err();
        assert!(matches!(err, ScribeError::IsDirectory { .. }));
        let err = super::save(dir.path(), &1_u8).unwrap_err();
        assert!(matches!(err, ScribeError::IsDirectory { .. }));

        let err = super::save(dir.path().join("value.yaml"), &1_u8).unwrap_err();
        assert!(matches!(err, ScribeError::UnsupportedExtension { .. }));

        let text = dir.path().join("value.txt");
        fs::write(&text, "1").unwrap();
        let err = super::load::<u8>(&text).unwrap_err();
        assert!(matches!(err, ScribeError::UnsupportedExtension { .. }));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ nope").unwrap();
        let err = super::load::<u8>(&broken).unwrap_err();
        assert!(matches!(err, ScribeError::Json(_)));
    }
}
