use crate::archive::{InputArchive, OutputArchive};
use crate::{Scribe, ScribeError};

// -----------------------------------------------------------------------------
// NamedValue

/// A value paired with the name of the field it is stored under.
///
/// `V` is `&T` for saving and `&mut T` for loading. Built by [`wrap`] or
/// [`wrap_optional`]; this is what `#[derive(Scribe)]` expands each field to.
///
/// # Examples
///
/// ```
/// use ps_scribe::archive::json::JsonInputArchive;
/// use ps_scribe::{wrap, wrap_optional};
///
/// let mut ar = JsonInputArchive::parse(r#"{ "depth": 3 }"#).unwrap();
///
/// let mut depth = 0_u32;
/// let mut limit = 10_u32;
/// wrap("depth", &mut depth).load(&mut ar).unwrap();
/// wrap_optional("limit", &mut limit).load(&mut ar).unwrap();
///
/// assert_eq!((depth, limit), (3, 10));
/// ```
#[derive(Debug)]
pub struct NamedValue<'a, V> {
    name: &'a str,
    value: V,
    optional: bool,
}

/// Pairs `value` with `name`. Reading fails if the field is absent.
#[inline]
pub fn wrap<V>(name: &str, value: V) -> NamedValue<'_, V> {
    NamedValue {
        name,
        value,
        optional: false,
    }
}

/// Pairs `value` with `name`. Reading an absent field leaves `value` untouched.
#[inline]
pub fn wrap_optional<V>(name: &str, value: V) -> NamedValue<'_, V> {
    NamedValue {
        name,
        value,
        optional: true,
    }
}

impl<V> NamedValue<'_, V> {
    #[inline]
    pub fn name(&self) -> &str {
        self.name
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl<T: Scribe + ?Sized> NamedValue<'_, &T> {
    /// Writes the field. Optional fields are always written.
    #[inline]
    pub fn save<A: OutputArchive>(self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_named_field(self.name, self.value)
    }
}

impl<T: Scribe + ?Sized> NamedValue<'_, &mut T> {
    /// Writes the field. Optional fields are always written.
    #[inline]
    pub fn save<A: OutputArchive>(self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_named_field(self.name, &*self.value)
    }

    /// Reads the field into the wrapped value.
    ///
    /// Only the absence of this field itself is tolerated by an optional
    /// wrapper; errors raised while reading its content always propagate.
    pub fn load<A: InputArchive>(self, ar: &mut A) -> Result<(), ScribeError> {
        match ar.start_field(self.name) {
            Ok(()) => {}
            Err(err) if self.optional && err.is_field_absent() => {
                log::trace!("optional field `{}` is absent, skipped", self.name);
                return Ok(());
            }
            Err(err) => return Err(err),
        }
        self.value.load(ar)?;
        ar.finish_node()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{wrap, wrap_optional};
    use crate::archive::json::{JsonInputArchive, JsonOutputArchive};
    use crate::{Scribe, ScribeError};
    use crate::archive::{InputArchive, OutputArchive};

    #[test]
    fn optional_is_written() {
        let mut ar = JsonOutputArchive::new();
        wrap("x", &1_u8).save(&mut ar).unwrap();
        wrap_optional("y", &2_u8).save(&mut ar).unwrap();
        assert_eq!(ar.into_value().unwrap(), json!({ "x": 1, "y": 2 }));
    }

    #[test]
    fn absent_field() {
        let mut x = 7_i32;

        let mut ar = JsonInputArchive::from_value(json!({ "y": 1 }));
        wrap_optional("x", &mut x).load(&mut ar).unwrap();
        assert_eq!(x, 7);

        let err = wrap("x", &mut x).load(&mut ar).unwrap_err();
        assert!(matches!(err, ScribeError::FieldAbsent { ref name } if name == "x"));
        assert_eq!(x, 7);
    }

    #[test]
    fn optional_still_rejects_bad_values() {
        let mut x = 7_i32;
        let mut ar = JsonInputArchive::from_value(json!({ "x": "seven" }));
        let err = wrap_optional("x", &mut x).load(&mut ar).unwrap_err();
        assert!(matches!(err, ScribeError::MalformedInput { .. }));
        assert_eq!(x, 7);
    }

    #[derive(Default)]
    struct Pair {
        a: u8,
        b: u8,
    }

    impl Scribe for Pair {
        fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
            wrap("a", &self.a).save(ar)?;
            wrap("b", &self.b).save(ar)
        }

        fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
            wrap("a", &mut self.a).load(ar)?;
            wrap("b", &mut self.b).load(ar)
        }
    }

    #[test]
    fn nested_absence_propagates() {
        let mut pair = Pair::default();
        let mut ar = JsonInputArchive::from_value(json!({ "pair": { "a": 1 } }));
        let err = wrap_optional("pair", &mut pair).load(&mut ar).unwrap_err();
        assert!(matches!(err, ScribeError::FieldAbsent { ref name } if name == "b"));
        assert_eq!(pair.a, 1);
    }
}
