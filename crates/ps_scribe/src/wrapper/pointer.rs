//! Ownership pointers and polymorphic dispatch.
//!
//! `Arc<B>`, `Rc<B>` and `Box<B>` are [`Scribe`] for every [`Pointee`] `B`.
//! When `B` is polymorphic, the pointee is written with a `"type"` field
//! naming its concrete type, and reading uses that tag to rebuild the
//! concrete value before converting it to `B`.
//!
//! Writing goes one of three ways:
//!
//! 1. The concrete type is `B` itself: its own tag and fields are written
//!    without touching the registry.
//! 2. The concrete type has an output binding for the archive: the binding
//!    writes the concrete tag and fields.
//! 3. Neither: depending on [`OutputArchive::unknown_types`], either the
//!    [`UNKNOWN_TAG`] and the fields exposed by `B` are written, or the write
//!    fails with [`ScribeError::UnknownRuntimeType`].
//!
//! `Arc` reads through a binding's shared path, `Box` and `Rc` through its
//! unique path.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};

use crate::archive::{InputArchive, OutputArchive, Primitive, UnknownTypes};
use crate::archive::{TYPE_FIELD, UNKNOWN_TAG};
use crate::registry::{self, InputBinding};
use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// Polymorphic

/// Supertrait of every trait used as a polymorphic base.
///
/// Implemented for all `Send + Sync + 'static` types; it gives a trait object
/// access to its concrete type.
///
/// ```
/// use ps_scribe::Polymorphic;
///
/// pub trait Animal: Polymorphic {
///     fn name(&self) -> &str;
/// }
/// ```
pub trait Polymorphic: Any + Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn concrete_type_id(&self) -> TypeId;

    fn concrete_type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> Polymorphic for T {
    #[inline]
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    #[inline]
    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    #[inline]
    fn concrete_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

// -----------------------------------------------------------------------------
// Pointee

/// A type that can sit behind `Arc`, `Rc` or `Box` in a saved value.
///
/// Not implemented by hand: use [`impl_pointee!`](crate::impl_pointee) for
/// concrete types (or `#[derive(Scribe)]`, which invokes it) and
/// [`declare_base!`](crate::declare_base) for trait objects.
pub trait Pointee: 'static {
    /// The type tag. [`UNKNOWN_TAG`] for untagged types.
    const TAG: &'static str;

    /// Whether values are written with a `"type"` field.
    const POLYMORPHIC: bool;

    fn runtime_type_id(&self) -> TypeId;

    fn runtime_type_name(&self) -> &'static str;

    fn as_erased(&self) -> &dyn Any;

    /// Writes the fields known statically for `Self`.
    fn save_inline<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError>;

    /// Reads a non-polymorphic value.
    fn load_boxed<A: InputArchive>(ar: &mut A) -> Result<Box<Self>, ScribeError>;

    /// Identity conversion of a value built by an input binding for `Self`.
    fn from_shared(erased: Arc<dyn Any + Send + Sync>) -> Option<Arc<Self>>;

    /// Identity conversion of a value built by an input binding for `Self`.
    fn from_unique(erased: Box<dyn Any + Send + Sync>) -> Option<Box<Self>>;

    /// Called before reading through a `Self` pointer with archive `A`.
    #[inline]
    fn warm_up<A: InputArchive>() {}
}

// -----------------------------------------------------------------------------
// Base fields

/// Field set of a base declared without `fields = ..`; writes nothing.
#[doc(hidden)]
pub struct NoBaseFields;

impl Scribe for NoBaseFields {
    #[inline]
    fn save<A: OutputArchive>(&self, _: &mut A) -> Result<(), ScribeError> {
        Ok(())
    }

    #[inline]
    fn load<A: InputArchive>(&mut self, _: &mut A) -> Result<(), ScribeError> {
        Ok(())
    }
}

#[doc(hidden)]
#[inline]
pub fn no_base_fields<B: ?Sized>(_: &B) -> &'static NoBaseFields {
    &NoBaseFields
}

#[doc(hidden)]
pub fn not_inline<B: ?Sized>() -> ScribeError {
    ScribeError::malformed(format!(
        "`{}` can only be read through its type tag",
        type_name::<B>()
    ))
}

// -----------------------------------------------------------------------------
// Write path

pub(crate) fn write_tag<A: OutputArchive>(ar: &mut A, tag: &str) -> Result<(), ScribeError> {
    ar.start_field(TYPE_FIELD)?;
    ar.write_value(Primitive::Str(Cow::Borrowed(tag)))?;
    ar.finish_node()
}

/// Writes the pointee of an ownership pointer declared as `B`.
pub fn save_pointee<B, A>(value: &B, ar: &mut A) -> Result<(), ScribeError>
where
    B: Pointee + ?Sized,
    A: OutputArchive,
{
    if !B::POLYMORPHIC {
        return value.save_inline(ar);
    }

    let runtime = value.runtime_type_id();
    if runtime == TypeId::of::<B>() {
        write_tag(ar, B::TAG)?;
        return value.save_inline(ar);
    }

    if let Some(binding) = registry::output_binding::<A>(runtime) {
        return binding.save(ar, value.as_erased());
    }

    match ar.unknown_types() {
        UnknownTypes::Sentinel => {
            log::warn!(
                "`{}` has no output binding, written as `{UNKNOWN_TAG}` with the fields of `{}`",
                value.runtime_type_name(),
                type_name::<B>(),
            );
            write_tag(ar, UNKNOWN_TAG)?;
            value.save_inline(ar)
        }
        UnknownTypes::Reject => Err(ScribeError::UnknownRuntimeType {
            type_name: value.runtime_type_name(),
        }),
    }
}

// -----------------------------------------------------------------------------
// Read path

fn read_tag<A: InputArchive>(ar: &mut A) -> Result<String, ScribeError> {
    match ar.start_field(TYPE_FIELD) {
        Ok(()) => {}
        Err(err) if err.is_field_absent() => {
            return Err(ScribeError::malformed("polymorphic value has no `type` field"));
        }
        Err(err) => return Err(err),
    }
    let tag = match ar.read_value()? {
        Primitive::Str(tag) => tag.into_owned(),
        other => {
            return Err(ScribeError::malformed(format!(
                "`type` field must be a string, found {}",
                other.kind()
            )));
        }
    };
    ar.finish_node()?;
    Ok(tag)
}

fn resolve<B, A>(ar: &mut A) -> Result<(String, InputBinding<A>), ScribeError>
where
    B: Pointee + ?Sized,
    A: InputArchive,
{
    B::warm_up::<A>();
    let tag = read_tag(ar)?;
    match registry::input_binding::<A>(&tag) {
        Some(binding) => Ok((tag, binding)),
        None => Err(ScribeError::UnknownType { tag }),
    }
}

fn incompatible<B: ?Sized>(tag: String) -> ScribeError {
    ScribeError::IncompatibleType {
        tag,
        declared: type_name::<B>(),
    }
}

fn load_shared<B, A>(ar: &mut A) -> Result<Arc<B>, ScribeError>
where
    B: Pointee + ?Sized,
    A: InputArchive,
{
    if !B::POLYMORPHIC {
        return B::load_boxed(ar).map(Arc::from);
    }

    let (tag, binding) = resolve::<B, A>(ar)?;
    let erased = binding.load_shared(ar)?;
    let value = if binding.type_id() == TypeId::of::<B>() {
        B::from_shared(erased)
    } else {
        registry::upcaster::<B>(binding.type_id()).and_then(|up| up.shared(erased))
    };
    value.ok_or_else(|| incompatible::<B>(tag))
}

fn load_unique<B, A>(ar: &mut A) -> Result<Box<B>, ScribeError>
where
    B: Pointee + ?Sized,
    A: InputArchive,
{
    if !B::POLYMORPHIC {
        return B::load_boxed(ar);
    }

    let (tag, binding) = resolve::<B, A>(ar)?;
    let erased = binding.load_unique(ar)?;
    let value = if binding.type_id() == TypeId::of::<B>() {
        B::from_unique(erased)
    } else {
        registry::upcaster::<B>(binding.type_id()).and_then(|up| up.unique(erased))
    };
    value.ok_or_else(|| incompatible::<B>(tag))
}

// -----------------------------------------------------------------------------
// Pointer implementations

impl<B: Pointee + ?Sized> Scribe for Arc<B> {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_pointee(&**self, ar)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        *self = load_shared(ar)?;
        Ok(())
    }
}

impl<B: Pointee + ?Sized> LoadNew for Arc<B> {
    #[inline]
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        load_shared(ar)
    }
}

impl<B: Pointee + ?Sized> Scribe for Box<B> {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_pointee(&**self, ar)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        *self = load_unique(ar)?;
        Ok(())
    }
}

impl<B: Pointee + ?Sized> LoadNew for Box<B> {
    #[inline]
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        load_unique(ar)
    }
}

impl<B: Pointee + ?Sized> Scribe for Rc<B> {
    #[inline]
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_pointee(&**self, ar)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        *self = load_unique(ar).map(Rc::from)?;
        Ok(())
    }
}

impl<B: Pointee + ?Sized> LoadNew for Rc<B> {
    #[inline]
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        load_unique(ar).map(Rc::from)
    }
}

crate::impl_pointee!(bool);
crate::impl_pointee!(char);
crate::impl_pointee!(i8);
crate::impl_pointee!(i16);
crate::impl_pointee!(i32);
crate::impl_pointee!(i64);
crate::impl_pointee!(isize);
crate::impl_pointee!(u8);
crate::impl_pointee!(u16);
crate::impl_pointee!(u32);
crate::impl_pointee!(u64);
crate::impl_pointee!(usize);
crate::impl_pointee!(f32);
crate::impl_pointee!(f64);
crate::impl_pointee!(String);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::sync::Arc;

    use serde_json::json;

    use crate::archive::json::{self, JsonOptions};
    use crate::archive::{InputArchive, OutputArchive, UnknownTypes};
    use crate::wrapper::named::wrap;
    use crate::{Polymorphic, Scribe, ScribeError, declare_base, impl_pointee, registry, upcaster};

    trait Shape: Polymorphic + core::fmt::Debug {
        fn area(&self) -> f64;
        fn common(&self) -> &Common;
    }

    declare_base!(dyn Shape, fields = Shape::common);

    #[derive(Scribe, Default, Debug, Clone, PartialEq)]
    struct Common {
        label: String,
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "pointer.Circle", base(dyn Shape))]
    struct Circle {
        #[scribe(flatten)]
        common: Common,
        r: f64,
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "pointer.Square", base(dyn Shape))]
    struct Square {
        #[scribe(flatten)]
        common: Common,
        s: f64,
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(polymorphic)]
    struct Hexagon {
        #[scribe(flatten)]
        common: Common,
        side: f64,
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "pointer.Unrelated")]
    struct Unrelated {
        id: u32,
    }

    impl Shape for Circle {
        fn area(&self) -> f64 {
            3.0 * self.r * self.r
        }
        fn common(&self) -> &Common {
            &self.common
        }
    }

    impl Shape for Square {
        fn area(&self) -> f64 {
            self.s * self.s
        }
        fn common(&self) -> &Common {
            &self.common
        }
    }

    impl Shape for Hexagon {
        fn area(&self) -> f64 {
            0.0
        }
        fn common(&self) -> &Common {
            &self.common
        }
    }

    fn setup() {
        registry::register::<Circle>();
        registry::register::<Square>();
        registry::register::<Unrelated>();
        registry::install(upcaster!(dyn Shape => Circle));
        registry::install(upcaster!(dyn Shape => Square));
    }

    fn concrete<T: Shape>(shape: &dyn Shape) -> Option<&T> {
        shape.as_any().downcast_ref::<T>()
    }

    fn label(text: &str) -> Common {
        Common {
            label: text.into(),
        }
    }

    #[test]
    fn shapes_through_shared_pointers() {
        setup();
        let shapes: Vec<Arc<dyn Shape>> = vec![
            Arc::new(Circle {
                common: label("a"),
                r: 2.0,
            }),
            Arc::new(Square {
                common: label("b"),
                s: 3.0,
            }),
        ];

        let value = json::to_value(&shapes).unwrap();
        assert_eq!(
            value,
            json!([
                { "type": "pointer.Circle", "label": "a", "r": 2.0 },
                { "type": "pointer.Square", "label": "b", "s": 3.0 },
            ])
        );

        let back: Vec<Arc<dyn Shape>> = json::from_value(value.clone()).unwrap();
        assert_eq!(concrete::<Circle>(&*back[0]).unwrap().r, 2.0);
        assert_eq!(concrete::<Square>(&*back[1]).unwrap().area(), 9.0);
        assert_eq!(json::to_value(&back).unwrap(), value);
    }

    #[test]
    fn unique_pointers_share_the_encoding() {
        setup();
        let boxed: Box<dyn Shape> = Box::new(Square {
            common: label("q"),
            s: 1.5,
        });
        let text = json::to_string(&boxed).unwrap();
        assert_eq!(text, r#"{"type":"pointer.Square","label":"q","s":1.5}"#);

        let back: Rc<dyn Shape> = json::from_str(&text).unwrap();
        assert_eq!(back.common().label, "q");
        assert!(concrete::<Square>(&*back).is_some());

        let mut slot: Box<dyn Shape> = Box::new(Circle::default());
        slot.load(&mut json::JsonInputArchive::parse(&text).unwrap())
            .unwrap();
        assert_eq!(slot.area(), 2.25);
    }

    #[test]
    fn declared_concrete_type() {
        setup();
        let circle = Arc::new(Circle {
            common: label("c"),
            r: 1.0,
        });
        let value = json::to_value(&circle).unwrap();
        assert_eq!(value, json!({ "type": "pointer.Circle", "label": "c", "r": 1.0 }));

        let back: Box<Circle> = json::from_value(value).unwrap();
        assert_eq!(*back, *circle);

        let err = json::from_value::<Arc<Circle>>(json!({ "type": "pointer.Square", "label": "x", "s": 1 }))
            .unwrap_err();
        assert!(matches!(err, ScribeError::IncompatibleType { ref tag, .. } if tag == "pointer.Square"));
    }

    #[derive(Default, Debug, PartialEq)]
    struct Lone {
        n: i32,
    }

    impl Scribe for Lone {
        fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
            wrap("n", &self.n).save(ar)
        }

        fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
            wrap("n", &mut self.n).load(ar)
        }
    }

    impl crate::LoadNew for Lone {
        fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
            let mut lone = Lone::default();
            lone.load(ar)?;
            Ok(lone)
        }
    }

    impl_pointee!(Lone, tag = "pointer.Lone");

    #[test]
    fn exact_type_skips_registry() {
        // `Lone` is never registered; its own tag comes from the fast path
        // and reading through `Arc<Lone>` binds it on demand.
        let value = json::to_value(&Arc::new(Lone { n: 4 })).unwrap();
        assert_eq!(value, json!({ "type": "pointer.Lone", "n": 4 }));

        let back: Arc<Lone> = json::from_value(value).unwrap();
        assert_eq!(back.n, 4);
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    struct Kind {
        r#type: String,
    }

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "pointer.Stamped")]
    struct Stamped {
        #[scribe(flatten)]
        kind: Kind,
    }

    #[test]
    fn tag_is_never_overwritten() {
        let stamped = Arc::new(Stamped {
            kind: Kind { r#type: "x".into() },
        });
        let err = json::to_value(&stamped).unwrap_err();
        assert!(matches!(err, ScribeError::Unrepresentable { .. }));

        assert_eq!(
            json::to_value(&stamped.kind).unwrap(),
            json!({ "type": "x" })
        );
    }

    #[test]
    fn unregistered_runtime_type() {
        setup();
        let shape: Arc<dyn Shape> = Arc::new(Hexagon {
            common: label("h"),
            side: 1.0,
        });

        let value = json::to_value(&shape).unwrap();
        assert_eq!(value, json!({ "type": "unknown", "label": "h" }));

        let err = json::from_value::<Arc<dyn Shape>>(value).unwrap_err();
        assert!(matches!(err, ScribeError::UnknownType { ref tag } if tag == "unknown"));

        let strict = JsonOptions::default().with_unknown_types(UnknownTypes::Reject);
        let err = json::to_value_with(&shape, strict).unwrap_err();
        assert!(matches!(err, ScribeError::UnknownRuntimeType { .. }));
        assert!(err.is_unknown_type());
    }

    #[test]
    fn unknown_or_missing_tags() {
        setup();
        let err = json::from_value::<Arc<dyn Shape>>(json!({ "type": "pointer.Triangle" }))
            .unwrap_err();
        assert!(matches!(err, ScribeError::UnknownType { ref tag } if tag == "pointer.Triangle"));

        let err = json::from_value::<Box<dyn Shape>>(json!({ "r": 1 })).unwrap_err();
        assert!(matches!(err, ScribeError::MalformedInput { .. }));

        let err = json::from_value::<Box<dyn Shape>>(json!({ "type": 3 })).unwrap_err();
        assert!(matches!(err, ScribeError::MalformedInput { .. }));

        let err = json::from_value::<Arc<dyn Shape>>(json!({ "type": "pointer.Unrelated", "id": 1 }))
            .unwrap_err();
        assert!(matches!(err, ScribeError::IncompatibleType { .. }));
    }

    #[test]
    fn empty_and_plain_pointers() {
        setup();
        let none: Option<Arc<dyn Shape>> = None;
        assert_eq!(json::to_value(&none).unwrap(), json!(null));
        let back: Option<Arc<dyn Shape>> = json::from_value(json!(null)).unwrap();
        assert!(back.is_none());

        assert_eq!(json::to_value(&Arc::new(5_u32)).unwrap(), json!(5));
        let plain: Box<Common> = json::from_value(json!({ "label": "p" })).unwrap();
        assert_eq!(*plain, label("p"));
    }
}
