use alloc::sync::Arc;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use crate::archive::{InputArchive, OutputArchive};
use crate::wrapper::pointer::write_tag;
use crate::{LoadNew, Pointee, ScribeError};

// -----------------------------------------------------------------------------
// Bindable

/// A concrete type that can be bound into the registry.
///
/// Trait objects and other unsized types are excluded by the `LoadNew` bound:
/// there is nothing to construct for them.
pub trait Bindable: Pointee + LoadNew + Send + Sync {}

impl<T: Pointee + LoadNew + Send + Sync> Bindable for T {}

// -----------------------------------------------------------------------------
// InputBinding

type LoadShared<A> = fn(&mut A) -> Result<Arc<dyn Any + Send + Sync>, ScribeError>;
type LoadUnique<A> = fn(&mut A) -> Result<Box<dyn Any + Send + Sync>, ScribeError>;

/// Builds one concrete type from archive `A`, behind a shared or unique pointer.
pub struct InputBinding<A> {
    type_id: TypeId,
    type_name: &'static str,
    shared: LoadShared<A>,
    unique: LoadUnique<A>,
}

impl<A: InputArchive> InputBinding<A> {
    pub fn of<T: Bindable>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shared: load_shared::<T, A>,
            unique: load_unique::<T, A>,
        }
    }

    /// The concrete type this binding builds.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn load_shared(&self, ar: &mut A) -> Result<Arc<dyn Any + Send + Sync>, ScribeError> {
        (self.shared)(ar)
    }

    #[inline]
    pub fn load_unique(&self, ar: &mut A) -> Result<Box<dyn Any + Send + Sync>, ScribeError> {
        (self.unique)(ar)
    }
}

fn load_shared<T: Bindable, A: InputArchive>(
    ar: &mut A,
) -> Result<Arc<dyn Any + Send + Sync>, ScribeError> {
    Ok(Arc::new(T::load_new(ar)?))
}

fn load_unique<T: Bindable, A: InputArchive>(
    ar: &mut A,
) -> Result<Box<dyn Any + Send + Sync>, ScribeError> {
    Ok(Box::new(T::load_new(ar)?))
}

// -----------------------------------------------------------------------------
// OutputBinding

type SaveErased<A> = fn(&mut A, &dyn Any) -> Result<(), ScribeError>;

/// Writes one concrete type, tag first, into archive `A`.
///
/// Saving only borrows the value, so shared and unique pointers use the same
/// function.
pub struct OutputBinding<A> {
    tag: &'static str,
    save: SaveErased<A>,
}

impl<A: OutputArchive> OutputBinding<A> {
    pub fn of<T: Bindable>() -> Self {
        Self {
            tag: T::TAG,
            save: save_erased::<T, A>,
        }
    }

    #[inline]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    #[inline]
    pub fn save(&self, ar: &mut A, value: &dyn Any) -> Result<(), ScribeError> {
        (self.save)(ar, value)
    }
}

fn save_erased<T: Bindable, A: OutputArchive>(
    ar: &mut A,
    value: &dyn Any,
) -> Result<(), ScribeError> {
    let Some(value) = value.downcast_ref::<T>() else {
        return Err(ScribeError::IncompatibleType {
            tag: T::TAG.into(),
            declared: type_name::<T>(),
        });
    };
    write_tag(ar, T::TAG)?;
    value.save(ar)
}

// -----------------------------------------------------------------------------
// Upcaster

type UpcastShared<B> = fn(Arc<dyn Any + Send + Sync>) -> Option<Arc<B>>;
type UpcastUnique<B> = fn(Box<dyn Any + Send + Sync>) -> Option<Box<B>>;

/// Converts a value built by an input binding into a pointer to base `B`.
///
/// Made by [`upcaster!`](crate::upcaster); each function returns `None`
/// when the erased value is not the derived type it was made for.
pub struct Upcaster<B: ?Sized> {
    shared: UpcastShared<B>,
    unique: UpcastUnique<B>,
}

impl<B: ?Sized> Upcaster<B> {
    #[inline]
    pub const fn new(shared: UpcastShared<B>, unique: UpcastUnique<B>) -> Self {
        Self { shared, unique }
    }

    #[inline]
    pub fn shared(&self, erased: Arc<dyn Any + Send + Sync>) -> Option<Arc<B>> {
        (self.shared)(erased)
    }

    #[inline]
    pub fn unique(&self, erased: Box<dyn Any + Send + Sync>) -> Option<Box<B>> {
        (self.unique)(erased)
    }
}

// -----------------------------------------------------------------------------
// Copy

impl<A> Clone for InputBinding<A> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for InputBinding<A> {}

impl<A> Clone for OutputBinding<A> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for OutputBinding<A> {}

impl<B: ?Sized> Clone for Upcaster<B> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ?Sized> Copy for Upcaster<B> {}

impl<A> fmt::Debug for InputBinding<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBinding")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl<A> fmt::Debug for OutputBinding<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBinding")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}
