//! Associative containers.
//!
//! With textual keys the map is inlined as an object: every entry becomes a
//! field named after its key, and reading consumes fields until none are left.
//! Any other key type is written like a sequence of `{ "key": .., "value": .. }`
//! objects behind a length marker.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use ps_scribe::archive::json;
//!
//! let by_name = BTreeMap::from([("a".to_string(), 1_u8), ("b".to_string(), 2)]);
//! assert_eq!(json::to_string(&by_name).unwrap(), r#"{"a":1,"b":2}"#);
//!
//! let by_id = BTreeMap::from([(7_u32, true)]);
//! assert_eq!(json::to_string(&by_id).unwrap(), r#"[{"key":7,"value":true}]"#);
//! ```

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use core::hash::{BuildHasher, Hash};
use std::collections::HashMap;

use crate::archive::{InputArchive, OutputArchive};
use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// MapKey

/// A type usable as a map key.
///
/// Keys with `TEXTUAL = true` must be convertible to and from a field name.
pub trait MapKey: LoadNew {
    const TEXTUAL: bool = false;

    fn to_field_name(&self) -> Option<Cow<'_, str>> {
        None
    }

    fn from_field_name(name: String) -> Option<Self> {
        let _ = name;
        None
    }
}

impl MapKey for String {
    const TEXTUAL: bool = true;

    #[inline]
    fn to_field_name(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }

    #[inline]
    fn from_field_name(name: String) -> Option<Self> {
        Some(name)
    }
}

macro_rules! impl_map_key {
    ($($ty:ty),* $(,)?) => {
        $(impl MapKey for $ty {})*
    };
}

impl_map_key!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// -----------------------------------------------------------------------------
// Helpers

const KEY_FIELD: &str = "key";
const VALUE_FIELD: &str = "value";

fn save_map<'a, K, V, A, I>(ar: &mut A, len: usize, entries: I) -> Result<(), ScribeError>
where
    K: MapKey + 'a,
    V: Scribe + 'a,
    A: OutputArchive,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    if K::TEXTUAL {
        for (key, value) in entries {
            let name = key
                .to_field_name()
                .ok_or_else(|| ScribeError::unrepresentable("map key has no field name"))?;
            ar.write_named_field(&name, value)?;
        }
        Ok(())
    } else {
        ar.write_size(len)?;
        for (key, value) in entries {
            ar.start_element()?;
            ar.write_named_field(KEY_FIELD, key)?;
            ar.write_named_field(VALUE_FIELD, value)?;
            ar.finish_node()?;
        }
        Ok(())
    }
}

fn load_map<K, V, A>(ar: &mut A, mut insert: impl FnMut(K, V)) -> Result<(), ScribeError>
where
    K: MapKey,
    V: LoadNew,
    A: InputArchive,
{
    if K::TEXTUAL {
        while let Some(name) = ar.next_field_name()? {
            let value = ar.read_new_field(&name)?;
            let key = K::from_field_name(name)
                .ok_or_else(|| ScribeError::malformed("field name is not a valid map key"))?;
            insert(key, value);
        }
    } else {
        let len = ar.read_size()?;
        for _ in 0..len {
            ar.start_element()?;
            let key = ar.read_new_field(KEY_FIELD)?;
            let value = ar.read_new_field(VALUE_FIELD)?;
            ar.finish_node()?;
            insert(key, value);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Implementations

impl<K: MapKey + Ord, V: LoadNew> Scribe for BTreeMap<K, V> {
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_map(ar, self.len(), self)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        self.clear();
        load_map(ar, |key: K, value: V| {
            self.insert(key, value);
        })
    }
}

impl<K: MapKey + Ord, V: LoadNew> LoadNew for BTreeMap<K, V> {
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        let mut map = BTreeMap::new();
        map.load(ar)?;
        Ok(map)
    }
}

impl<K, V, S> Scribe for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: LoadNew,
    S: BuildHasher + Default,
{
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_map(ar, self.len(), self)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        self.clear();
        load_map(ar, |key: K, value: V| {
            self.insert(key, value);
        })
    }
}

impl<K, V, S> LoadNew for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: LoadNew,
    S: BuildHasher + Default,
{
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        let mut map = HashMap::default();
        map.load(ar)?;
        Ok(map)
    }
}

// -----------------------------------------------------------------------------
// Tests
