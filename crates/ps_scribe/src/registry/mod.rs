//! The process-wide binding registry.
//!
//! ## Menu
//!
//! - [`BindingRegistry`]: tags, per-archive input and output tables, upcasters.
//! - [`InputBinding`]: builds one concrete type from an input archive.
//! - [`OutputBinding`]: writes one concrete type, tag first, to an output archive.
//! - [`Upcaster`]: turns a freshly built concrete value into a pointer to a base.
//! - [`Registration`]: a deferred change to the registry.
//!
//! ## Registration
//!
//! Types deriving `Scribe` with a `tag` submit a [`Registration`] that binds
//! them for the JSON archives, plus one upcaster per declared `base`. With the
//! `auto_register` feature these are collected through [`inventory`] and
//! applied when the registry is first touched. Without it, call [`register`]
//! and [`install`] during startup, before any polymorphic value is loaded.
//!
//! Archives other than JSON are bound with [`bind_input`] and [`bind_output`].
//! A type declared with `impl_pointee!(T, tag = ..)` also binds itself for
//! the input archive in use the first time a pointer to it is loaded.
//!
//! All functions are safe to call from several threads. Registration is
//! idempotent: binding the same type twice is a no-op.
//!
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod binding;
mod binding_registry;
mod registration;

// -----------------------------------------------------------------------------
// Exports

pub use binding::{Bindable, InputBinding, OutputBinding, Upcaster};
pub use binding_registry::BindingRegistry;
pub use registration::Registration;

// -----------------------------------------------------------------------------
// Global registry

use core::any::TypeId;
use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::archive::json::{JsonInputArchive, JsonOutputArchive};
use crate::archive::{InputArchive, OutputArchive};

static REGISTRY: LazyLock<RwLock<BindingRegistry>> = LazyLock::new(|| {
    #[cfg_attr(not(feature = "auto_register"), expect(unused_mut, reason = "no submissions"))]
    let mut registry = BindingRegistry::empty();
    #[cfg(feature = "auto_register")]
    for registration in inventory::iter::<Registration> {
        registration.apply(&mut registry);
    }
    RwLock::new(registry)
});

#[inline]
fn read() -> RwLockReadGuard<'static, BindingRegistry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn write() -> RwLockWriteGuard<'static, BindingRegistry> {
    REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

/// Binds `T` for the JSON archives.
///
/// # Examples
///
/// ```
/// use ps_scribe::{Scribe, registry};
///
/// #[derive(Scribe, Default)]
/// #[scribe(tag = "doc.Marker")]
/// struct Marker;
///
/// registry::register::<Marker>();
/// assert!(registry::is_registered::<Marker>());
/// ```
pub fn register<T: Bindable>() {
    let bound = {
        let registry = read();
        registry.is_refused::<T>()
            || registry.contains_input::<JsonInputArchive>(T::TAG)
                && registry.contains_output::<T, JsonOutputArchive>()
    };
    if !bound {
        write().register::<T>();
    }
}

/// Binds `T` for input archive `A`.
pub fn bind_input<T: Bindable, A: InputArchive>() {
    let bound = {
        let registry = read();
        registry.is_refused::<T>() || registry.contains_input::<A>(T::TAG)
    };
    if !bound {
        write().insert_input::<T, A>();
    }
}

/// Binds `T` for output archive `A`.
pub fn bind_output<T: Bindable, A: OutputArchive>() {
    let bound = {
        let registry = read();
        registry.is_refused::<T>() || registry.contains_output::<T, A>()
    };
    if !bound {
        write().insert_output::<T, A>();
    }
}

/// Applies `registration` to the process-wide registry.
pub fn install(registration: Registration) {
    registration.apply(&mut write());
}

/// Returns `true` if `T` owns a tag in the registry.
pub fn is_registered<T: ?Sized + 'static>() -> bool {
    read().tag_of::<T>().is_some()
}

/// The tag `T` is bound under, if any.
pub fn tag_of<T: ?Sized + 'static>() -> Option<&'static str> {
    read().tag_of::<T>()
}

/// The input binding of `tag` for archive `A`.
pub fn input_binding<A: InputArchive>(tag: &str) -> Option<InputBinding<A>> {
    read().input::<A>(tag)
}

/// The output binding of the concrete type `type_id` for archive `A`.
pub fn output_binding<A: OutputArchive>(type_id: TypeId) -> Option<OutputBinding<A>> {
    read().output::<A>(type_id)
}

/// The upcaster from the concrete type `derived` to `B`.
pub fn upcaster<B: ?Sized + 'static>(derived: TypeId) -> Option<Upcaster<B>> {
    read().upcaster::<B>(derived)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::any::TypeId;
    use std::thread;

    use serde_json::{Value, json};

    use crate::archive::json::{self, JsonInputArchive, JsonOutputArchive};
    use crate::archive::{InputArchive, OutputArchive, Primitive, UnknownTypes};
    use crate::{LoadNew, Polymorphic, Scribe, ScribeError, declare_base, registry, upcaster};

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "registry.Threaded")]
    struct Threaded {
        id: u32,
    }

    trait Item: Polymorphic + core::fmt::Debug {
        fn id(&self) -> u32;
    }

    declare_base!(dyn Item);

    #[derive(Scribe, Default, Debug, PartialEq)]
    #[scribe(tag = "registry.Elsewhere", base(dyn Item))]
    struct Elsewhere {
        id: u32,
    }

    impl Item for Elsewhere {
        fn id(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn concurrent_registration() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(registry::register::<Threaded>))
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry::tag_of::<Threaded>(), Some("registry.Threaded"));
        let binding = registry::input_binding::<JsonInputArchive>("registry.Threaded").unwrap();
        assert_eq!(binding.type_id(), TypeId::of::<Threaded>());
        assert!(registry::output_binding::<JsonOutputArchive>(TypeId::of::<Threaded>()).is_some());

        let value: Arc<Threaded> = json::from_value(json!({ "type": "registry.Threaded", "id": 4 })).unwrap();
        assert_eq!(value.id, 4);
    }

    #[derive(Scribe, Default)]
    #[scribe(tag = "registry.Contested")]
    struct Holder;

    #[derive(Scribe, Default)]
    #[scribe(tag = "registry.Contested")]
    struct Rival;

    #[test]
    fn refused_types_stay_unbound() {
        registry::register::<Holder>();
        registry::register::<Rival>();
        let owner = super::read().type_of("registry.Contested").unwrap();

        for _ in 0..3 {
            registry::register::<Rival>();
            registry::register::<Holder>();
            registry::bind_input::<Rival, JsonInputArchive>();
            registry::bind_output::<Holder, JsonOutputArchive>();
        }

        let registry = super::read();
        assert_eq!(registry.type_of("registry.Contested"), Some(owner));
        assert_ne!(registry.is_refused::<Holder>(), registry.is_refused::<Rival>());
        assert_eq!(
            registry.tag_of::<Holder>().is_some(),
            owner == TypeId::of::<Holder>()
        );
        assert_eq!(
            registry.tag_of::<Rival>().is_some(),
            owner == TypeId::of::<Rival>()
        );
    }

    // A second archive type sharing the JSON document model.
    struct OtherOut(JsonOutputArchive);
    struct OtherIn(JsonInputArchive);

    impl OutputArchive for OtherOut {
        fn start_field(&mut self, name: &str) -> Result<(), ScribeError> {
            self.0.start_field(name)
        }

        fn start_element(&mut self) -> Result<(), ScribeError> {
            self.0.start_element()
        }

        fn finish_node(&mut self) -> Result<(), ScribeError> {
            self.0.finish_node()
        }

        fn write_size(&mut self, len: usize) -> Result<(), ScribeError> {
            self.0.write_size(len)
        }

        fn write_value(&mut self, value: Primitive<'_>) -> Result<(), ScribeError> {
            self.0.write_value(value)
        }

        fn unknown_types(&self) -> UnknownTypes {
            UnknownTypes::Reject
        }
    }

    impl InputArchive for OtherIn {
        fn start_field(&mut self, name: &str) -> Result<(), ScribeError> {
            self.0.start_field(name)
        }

        fn start_element(&mut self) -> Result<(), ScribeError> {
            self.0.start_element()
        }

        fn finish_node(&mut self) -> Result<(), ScribeError> {
            self.0.finish_node()
        }

        fn read_size(&mut self) -> Result<usize, ScribeError> {
            self.0.read_size()
        }

        fn read_value(&mut self) -> Result<Primitive<'static>, ScribeError> {
            self.0.read_value()
        }

        fn is_null(&mut self) -> Result<bool, ScribeError> {
            self.0.is_null()
        }

        fn next_field_name(&mut self) -> Result<Option<String>, ScribeError> {
            self.0.next_field_name()
        }
    }

    #[test]
    fn archives_have_separate_tables() {
        registry::register::<Elsewhere>();
        registry::install(upcaster!(dyn Item => Elsewhere));
        let value: Arc<dyn Item> = Arc::new(Elsewhere { id: 9 });

        let mut out = OtherOut(JsonOutputArchive::new());
        let err = value.save(&mut out).unwrap_err();
        assert!(matches!(err, ScribeError::UnknownRuntimeType { .. }));

        let mut ar = OtherIn(JsonInputArchive::from_value(
            json!({ "type": "registry.Elsewhere", "id": 9 }),
        ));
        let err = <Box<dyn Item>>::load_new(&mut ar).unwrap_err();
        assert!(err.is_unknown_type());

        registry::bind_output::<Elsewhere, OtherOut>();
        registry::bind_input::<Elsewhere, OtherIn>();

        let mut out = OtherOut(JsonOutputArchive::new());
        value.save(&mut out).unwrap();
        let written: Value = out.0.into_value().unwrap();
        assert_eq!(written, json!({ "type": "registry.Elsewhere", "id": 9 }));

        let mut ar = OtherIn(JsonInputArchive::from_value(written));
        let back = <Box<dyn Item>>::load_new(&mut ar).unwrap();
        assert_eq!(back.id(), 9);
    }
}
