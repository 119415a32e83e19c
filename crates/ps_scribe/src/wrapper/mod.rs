//! Wrappers that decide how a value reaches the archive.
//!
//! - [`named`]: pairs a value with its field name, optionally tolerating absence.
//! - [`pointer`]: ownership pointers, where polymorphic values get a type tag.
//! - [`container`]: sequences, written as a length followed by each element.
//! - [`map`]: associative containers, inlined as an object when keys are text.

// -----------------------------------------------------------------------------
// Modules

pub mod container;
pub mod map;
pub mod named;
pub mod pointer;
