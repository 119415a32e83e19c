use alloc::borrow::Cow;

use crate::ScribeError;
use crate::archive::{InputArchive, OutputArchive, Primitive};

// -----------------------------------------------------------------------------
// Scribe

/// A value that can write itself into the current node of an archive and
/// read itself back in place.
///
/// Usually derived:
///
/// ```
/// use ps_scribe::Scribe;
/// use ps_scribe::archive::json;
///
/// #[derive(Scribe, Default, Debug, PartialEq)]
/// struct Window {
///     title: String,
///     #[scribe(optional)]
///     width: u32,
/// }
///
/// let window: Window = json::from_str(r#"{ "title": "main" }"#).unwrap();
/// assert_eq!(window, Window { title: "main".into(), width: 0 });
/// ```
pub trait Scribe {
    /// Writes `self` into the current node.
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError>;

    /// Overwrites `self` from the current node.
    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError>;
}

/// A [`Scribe`] value that can be built from a node without an existing instance.
///
/// Dynamic containers, maps and pointers read their elements through this.
pub trait LoadNew: Scribe + Sized {
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError>;
}

// -----------------------------------------------------------------------------
// Primitives

fn mismatch<T>(expected: &str, found: &Primitive<'_>) -> Result<T, ScribeError> {
    Err(ScribeError::malformed(format!(
        "expected {expected}, found {}",
        found.kind()
    )))
}

macro_rules! impl_load_new_by_default {
    ($($ty:ty),* $(,)?) => {$(
        impl LoadNew for $ty {
            #[inline]
            fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
                let mut value = <$ty as Default>::default();
                value.load(ar)?;
                Ok(value)
            }
        }
    )*};
}

macro_rules! impl_integer {
    ($variant:ident: $($ty:ty),* $(,)?) => {$(
        impl Scribe for $ty {
            #[inline]
            fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
                ar.write_value(Primitive::$variant((*self).into()))
            }

            fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
                let value = ar.read_value()?;
                let parsed = match value {
                    Primitive::Int(v) => <$ty>::try_from(v).ok(),
                    Primitive::UInt(v) => <$ty>::try_from(v).ok(),
                    ref other => return mismatch(stringify!($ty), other),
                };
                *self = parsed.ok_or_else(|| {
                    ScribeError::malformed(format!(
                        "{value:?} is out of range for {}",
                        stringify!($ty)
                    ))
                })?;
                Ok(())
            }
        }

        impl_load_new_by_default!($ty);
    )*};
}

impl_integer!(Int: i8, i16, i32, i64);
impl_integer!(UInt: u8, u16, u32, u64);

impl Scribe for usize {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_value(Primitive::UInt(*self as u64))
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        let mut wide = 0_u64;
        wide.load(ar)?;
        *self = usize::try_from(wide)
            .map_err(|_| ScribeError::malformed(format!("{wide} is out of range for usize")))?;
        Ok(())
    }
}

impl Scribe for isize {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_value(Primitive::Int(*self as i64))
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        let mut wide = 0_i64;
        wide.load(ar)?;
        *self = isize::try_from(wide)
            .map_err(|_| ScribeError::malformed(format!("{wide} is out of range for isize")))?;
        Ok(())
    }
}

macro_rules! impl_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Scribe for $ty {
            #[inline]
            fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
                ar.write_value(Primitive::Float((*self).into()))
            }

            fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
                *self = match ar.read_value()? {
                    Primitive::Float(v) => v as $ty,
                    Primitive::Int(v) => v as $ty,
                    Primitive::UInt(v) => v as $ty,
                    ref other => return mismatch(stringify!($ty), other),
                };
                Ok(())
            }
        }
    )*};
}

impl_float!(f32, f64);

impl Scribe for bool {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_value(Primitive::Bool(*self))
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        match ar.read_value()? {
            Primitive::Bool(v) => {
                *self = v;
                Ok(())
            }
            ref other => mismatch("bool", other),
        }
    }
}

impl Scribe for char {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        let mut buf = [0_u8; 4];
        ar.write_value(Primitive::Str(Cow::Borrowed(self.encode_utf8(&mut buf))))
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        match ar.read_value()? {
            Primitive::Str(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        *self = c;
                        Ok(())
                    }
                    _ => Err(ScribeError::malformed(format!(
                        "expected a single character, found {text:?}"
                    ))),
                }
            }
            ref other => mismatch("char", other),
        }
    }
}

impl Scribe for String {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        ar.write_value(Primitive::Str(Cow::Borrowed(self)))
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        match ar.read_value()? {
            Primitive::Str(text) => {
                *self = text.into_owned();
                Ok(())
            }
            ref other => mismatch("string", other),
        }
    }
}

impl_load_new_by_default!(usize, isize, f32, f64, bool, char, String);

// -----------------------------------------------------------------------------
// Option

/// `None` is written as the null marker.
impl<T: LoadNew> Scribe for Option<T> {
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        match self {
            Some(value) => value.save(ar),
            None => ar.write_value(Primitive::Null),
        }
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        *self = Self::load_new(ar)?;
        Ok(())
    }
}

impl<T: LoadNew> LoadNew for Option<T> {
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        if ar.is_null()? {
            ar.read_value()?;
            Ok(None)
        } else {
            T::load_new(ar).map(Some)
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
