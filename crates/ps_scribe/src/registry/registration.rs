use core::fmt;

use crate::registry::{Bindable, BindingRegistry};

/// A deferred change to a [`BindingRegistry`].
///
/// Built by [`register_type!`](crate::register_type),
/// [`upcaster!`](crate::upcaster) and `#[derive(Scribe)]`. Applied either
/// through [`registry::install`](crate::registry::install) or, with the
/// `auto_register` feature, automatically when the process-wide registry is
/// first used.
///
/// # Examples
///
/// ```
/// use ps_scribe::Scribe;
/// use ps_scribe::archive::json::JsonInputArchive;
/// use ps_scribe::registry::{BindingRegistry, Registration};
///
/// #[derive(Scribe, Default)]
/// #[scribe(tag = "doc.Token")]
/// struct Token {
///     text: String,
/// }
///
/// let mut registry = BindingRegistry::empty();
/// Registration::of_type::<Token>().apply(&mut registry);
/// assert!(registry.contains_input::<JsonInputArchive>("doc.Token"));
/// ```
#[derive(Clone, Copy)]
pub struct Registration(fn(&mut BindingRegistry));

impl Registration {
    /// Wraps an arbitrary change.
    #[inline]
    pub const fn new(func: fn(&mut BindingRegistry)) -> Self {
        Self(func)
    }

    /// Binds `T` for the JSON archives.
    #[inline]
    pub const fn of_type<T: Bindable>() -> Self {
        Self(BindingRegistry::register::<T>)
    }

    /// Applies the change to `registry`.
    #[inline]
    pub fn apply(&self, registry: &mut BindingRegistry) {
        (self.0)(registry);
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Registration").finish_non_exhaustive()
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(Registration);

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::Registration;
    use crate::archive::json::JsonInputArchive;
    use crate::archive::{InputArchive, OutputArchive};
    use crate::registry::BindingRegistry;
    use crate::{LoadNew, Scribe, ScribeError, register_type};

    #[derive(Scribe, Default)]
    #[scribe(tag = "registration.Applied")]
    struct Applied {
        on: bool,
    }

    #[derive(Default)]
    struct Submitted;

    impl Scribe for Submitted {
        fn save<A: OutputArchive>(&self, _: &mut A) -> Result<(), ScribeError> {
            Ok(())
        }

        fn load<A: InputArchive>(&mut self, _: &mut A) -> Result<(), ScribeError> {
            Ok(())
        }
    }

    impl LoadNew for Submitted {
        fn load_new<A: InputArchive>(_: &mut A) -> Result<Self, ScribeError> {
            Ok(Submitted)
        }
    }

    crate::impl_pointee!(Submitted, tag = "registration.Submitted");
    register_type!(Submitted);

    #[test]
    fn applies_to_given_registry() {
        let mut registry = BindingRegistry::empty();
        let registration = Registration::of_type::<Applied>();
        registration.apply(&mut registry);
        registration.apply(&mut registry);
        assert_eq!(registry.tag_of::<Applied>(), Some("registration.Applied"));
        assert!(registry.contains_input::<JsonInputArchive>("registration.Applied"));

        let custom = Registration::new(|registry| {
            registry.insert_input::<Submitted, JsonInputArchive>();
        });
        custom.apply(&mut registry);
        assert!(registry.contains_input::<JsonInputArchive>("registration.Submitted"));
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn submissions_reach_global_registry() {
        assert_eq!(
            crate::registry::tag_of::<Submitted>(),
            Some("registration.Submitted")
        );
        assert!(crate::registry::is_registered::<Applied>());
    }
}
