#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro names this crate `::ps_scribe`, which must also resolve
// for types deriving `Scribe` inside the crate and its tests.
extern crate self as ps_scribe;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod macros;
mod scribe;

pub mod archive;
pub mod io;
pub mod registry;
pub mod wrapper;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::ScribeError;
pub use ps_scribe_derive::Scribe;
pub use scribe::{LoadNew, Scribe};
pub use wrapper::map::MapKey;
pub use wrapper::named::{NamedValue, wrap, wrap_optional};
pub use wrapper::pointer::{Pointee, Polymorphic};
