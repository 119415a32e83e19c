//! Paths used by the code that `macro_rules!` and `#[derive(Scribe)]` expand to.

pub use alloc::boxed::Box;
pub use alloc::sync::Arc;
pub use core::any::{Any, TypeId, type_name};

#[cfg(feature = "auto_register")]
pub use inventory;
