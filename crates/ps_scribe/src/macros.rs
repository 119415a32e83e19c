// -----------------------------------------------------------------------------
// Registration

/// Submits a [`Registration`](crate::registry::Registration) that binds a
/// tagged type for the JSON archives.
///
/// Only does something with the `auto_register` feature; otherwise call
/// [`registry::register`](crate::registry::register) during startup.
/// `#[derive(Scribe)]` expands to this for types with a `tag`.
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! register_type {
    ($ty:ty) => {
        const _: () = {
            $crate::__macro_exports::inventory::submit! {
                $crate::registry::Registration::of_type::<$ty>()
            }
        };
    };
}

/// Submits a [`Registration`](crate::registry::Registration) that binds a
/// tagged type for the JSON archives.
///
/// Only does something with the `auto_register` feature; otherwise call
/// [`registry::register`](crate::registry::register) during startup.
/// `#[derive(Scribe)]` expands to this for types with a `tag`.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! register_type {
    ($ty:ty) => {};
}

/// Submits the [`upcaster!`](crate::upcaster) between a base and a derived type.
///
/// Only does something with the `auto_register` feature; otherwise pass the
/// `upcaster!` to [`registry::install`](crate::registry::install).
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! register_relation {
    (dyn $base:path => $derived:ty) => {
        const _: () = {
            $crate::__macro_exports::inventory::submit! {
                $crate::upcaster!(dyn $base => $derived)
            }
        };
    };
}

/// Submits the [`upcaster!`](crate::upcaster) between a base and a derived type.
///
/// Only does something with the `auto_register` feature; otherwise pass the
/// `upcaster!` to [`registry::install`](crate::registry::install).
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! register_relation {
    (dyn $base:path => $derived:ty) => {};
}

/// Builds a [`Registration`](crate::registry::Registration) declaring that
/// values built as `$derived` can be read through pointers to `dyn $base`.
///
/// # Examples
///
/// ```
/// use ps_scribe::{Polymorphic, Scribe, declare_base, registry, upcaster};
///
/// pub trait Animal: Polymorphic {}
/// declare_base!(dyn Animal);
///
/// #[derive(Scribe, Default)]
/// #[scribe(tag = "doc.Cat")]
/// struct Cat {
///     lives: u8,
/// }
///
/// impl Animal for Cat {}
///
/// registry::register::<Cat>();
/// registry::install(upcaster!(dyn Animal => Cat));
///
/// let cat: Box<dyn Animal> =
///     ps_scribe::archive::json::from_str(r#"{"type":"doc.Cat","lives":9}"#).unwrap();
/// assert!(Polymorphic::as_any(&*cat).is::<Cat>());
/// ```
#[macro_export]
macro_rules! upcaster {
    (dyn $base:path => $derived:ty) => {
        $crate::registry::Registration::new(|registry| {
            registry.insert_relation::<dyn $base, $derived>(
                $crate::registry::Upcaster::<dyn $base>::new(
                    |erased| {
                        let value: $crate::__macro_exports::Arc<dyn $base> =
                            erased.downcast::<$derived>().ok()?;
                        ::core::option::Option::Some(value)
                    },
                    |erased| {
                        let value: $crate::__macro_exports::Box<dyn $base> =
                            erased.downcast::<$derived>().ok()?;
                        ::core::option::Option::Some(value)
                    },
                ),
            );
        })
    };
}

// -----------------------------------------------------------------------------
// Pointee

/// Makes `dyn Trait` usable behind `Arc`, `Rc` and `Box` in saved values.
///
/// `Trait` must have [`Polymorphic`](crate::Polymorphic) as a supertrait.
/// With `fields = accessor`, where `accessor: fn(&dyn Trait) -> &impl Scribe`,
/// the fields returned by the accessor are written for runtime types that
/// have no output binding; without it such values are written as an empty
/// `"unknown"` node.
///
/// # Examples
///
/// ```
/// use ps_scribe::{Polymorphic, Scribe, declare_base};
///
/// #[derive(Scribe, Default)]
/// pub struct Header {
///     name: String,
/// }
///
/// pub trait Document: Polymorphic {
///     fn header(&self) -> &Header;
/// }
///
/// declare_base!(dyn Document, fields = Document::header);
/// ```
#[macro_export]
macro_rules! declare_base {
    (dyn $base:path) => {
        $crate::declare_base!(dyn $base, fields = $crate::wrapper::pointer::no_base_fields);
    };
    (dyn $base:path, fields = $accessor:expr) => {
        impl $crate::Pointee for dyn $base {
            const TAG: &'static str = $crate::archive::UNKNOWN_TAG;
            const POLYMORPHIC: bool = true;

            #[inline]
            fn runtime_type_id(&self) -> $crate::__macro_exports::TypeId {
                <dyn $base as $crate::Polymorphic>::concrete_type_id(self)
            }

            #[inline]
            fn runtime_type_name(&self) -> &'static str {
                <dyn $base as $crate::Polymorphic>::concrete_type_name(self)
            }

            #[inline]
            fn as_erased(&self) -> &dyn $crate::__macro_exports::Any {
                <dyn $base as $crate::Polymorphic>::as_any(self)
            }

            fn save_inline<A: $crate::archive::OutputArchive>(
                &self,
                ar: &mut A,
            ) -> ::core::result::Result<(), $crate::ScribeError> {
                $crate::Scribe::save($accessor(self), ar)
            }

            fn load_boxed<A: $crate::archive::InputArchive>(
                _: &mut A,
            ) -> ::core::result::Result<$crate::__macro_exports::Box<Self>, $crate::ScribeError> {
                ::core::result::Result::Err($crate::wrapper::pointer::not_inline::<Self>())
            }

            #[inline]
            fn from_shared(
                _: $crate::__macro_exports::Arc<dyn $crate::__macro_exports::Any + Send + Sync>,
            ) -> ::core::option::Option<$crate::__macro_exports::Arc<Self>> {
                ::core::option::Option::None
            }

            #[inline]
            fn from_unique(
                _: $crate::__macro_exports::Box<dyn $crate::__macro_exports::Any + Send + Sync>,
            ) -> ::core::option::Option<$crate::__macro_exports::Box<Self>> {
                ::core::option::Option::None
            }
        }
    };
}

/// Implements [`Pointee`](crate::Pointee) for a concrete [`LoadNew`](crate::LoadNew) type.
///
/// - `impl_pointee!(T)`: written inline, without a `"type"` field.
/// - `impl_pointee!(T, polymorphic)`: written with a `"type"` field but has
///   no tag of its own, so it can only be written through a base pointer.
/// - `impl_pointee!(T, tag = "..")`: written with its tag; reading through a
///   `T` pointer binds `T` for the archive in use.
///
/// `#[derive(Scribe)]` invokes this for non-generic types.
#[macro_export]
macro_rules! impl_pointee {
    (@common) => {
        #[inline]
        fn runtime_type_id(&self) -> $crate::__macro_exports::TypeId {
            $crate::__macro_exports::TypeId::of::<Self>()
        }

        #[inline]
        fn runtime_type_name(&self) -> &'static str {
            $crate::__macro_exports::type_name::<Self>()
        }

        #[inline]
        fn as_erased(&self) -> &dyn $crate::__macro_exports::Any {
            self
        }

        #[inline]
        fn save_inline<A: $crate::archive::OutputArchive>(
            &self,
            ar: &mut A,
        ) -> ::core::result::Result<(), $crate::ScribeError> {
            $crate::Scribe::save(self, ar)
        }

        #[inline]
        fn load_boxed<A: $crate::archive::InputArchive>(
            ar: &mut A,
        ) -> ::core::result::Result<$crate::__macro_exports::Box<Self>, $crate::ScribeError> {
            <Self as $crate::LoadNew>::load_new(ar).map($crate::__macro_exports::Box::new)
        }
    };
    (@downcast) => {
        #[inline]
        fn from_shared(
            erased: $crate::__macro_exports::Arc<dyn $crate::__macro_exports::Any + Send + Sync>,
        ) -> ::core::option::Option<$crate::__macro_exports::Arc<Self>> {
            erased.downcast::<Self>().ok()
        }

        #[inline]
        fn from_unique(
            erased: $crate::__macro_exports::Box<dyn $crate::__macro_exports::Any + Send + Sync>,
        ) -> ::core::option::Option<$crate::__macro_exports::Box<Self>> {
            erased.downcast::<Self>().ok()
        }
    };
    ($ty:ty) => {
        impl $crate::Pointee for $ty {
            const TAG: &'static str = $crate::archive::UNKNOWN_TAG;
            const POLYMORPHIC: bool = false;

            $crate::impl_pointee!(@common);

            #[inline]
            fn from_shared(
                _: $crate::__macro_exports::Arc<dyn $crate::__macro_exports::Any + Send + Sync>,
            ) -> ::core::option::Option<$crate::__macro_exports::Arc<Self>> {
                ::core::option::Option::None
            }

            #[inline]
            fn from_unique(
                _: $crate::__macro_exports::Box<dyn $crate::__macro_exports::Any + Send + Sync>,
            ) -> ::core::option::Option<$crate::__macro_exports::Box<Self>> {
                ::core::option::Option::None
            }
        }
    };
    ($ty:ty, polymorphic) => {
        impl $crate::Pointee for $ty {
            const TAG: &'static str = $crate::archive::UNKNOWN_TAG;
            const POLYMORPHIC: bool = true;

            $crate::impl_pointee!(@common);
            $crate::impl_pointee!(@downcast);
        }
    };
    ($ty:ty, tag = $tag:expr) => {
        impl $crate::Pointee for $ty {
            const TAG: &'static str = $tag;
            const POLYMORPHIC: bool = true;

            $crate::impl_pointee!(@common);
            $crate::impl_pointee!(@downcast);

            #[inline]
            fn warm_up<A: $crate::archive::InputArchive>() {
                $crate::registry::bind_input::<Self, A>();
            }
        }
    };
}
