//! The tree reader/writer interface the rest of the crate is written against.
//!
//! An archive walks one node of a document tree at a time. Saving a struct
//! opens one child node per field with [`OutputArchive::start_field`], writes
//! into it, and closes it with [`OutputArchive::finish_node`]. Sequences
//! announce their length with `write_size` and open one child per element.
//! Leaves are [`Primitive`] values.
//!
//! Every concrete archive type is its own context for the
//! [binding registry](crate::registry): bindings made for one archive type are
//! never visible to another.

use alloc::borrow::Cow;

use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// Modules

pub mod json;

// -----------------------------------------------------------------------------
// Constants

/// Name of the field holding the type tag of a polymorphic value.
pub const TYPE_FIELD: &str = "type";

/// Tag written for polymorphic values whose concrete type has no tag.
pub const UNKNOWN_TAG: &str = "unknown";

// -----------------------------------------------------------------------------
// Primitive

/// A leaf value of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Cow<'a, str>),
}

impl Primitive<'_> {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Bool(_) => "bool",
            Primitive::Int(_) | Primitive::UInt(_) => "integer",
            Primitive::Float(_) => "float",
            Primitive::Str(_) => "string",
        }
    }
}

// -----------------------------------------------------------------------------
// UnknownTypes

/// What to do when a polymorphic value's runtime type has no output binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTypes {
    /// Write the [`UNKNOWN_TAG`] and the fields exposed by the declared base.
    #[default]
    Sentinel,
    /// Fail with [`ScribeError::UnknownRuntimeType`].
    Reject,
}

// -----------------------------------------------------------------------------
// OutputArchive

/// Writes a document tree.
pub trait OutputArchive: Sized + 'static {
    /// Opens the child node `name` of the current node.
    fn start_field(&mut self, name: &str) -> Result<(), ScribeError>;

    /// Opens the next element of the current sequence node.
    fn start_element(&mut self) -> Result<(), ScribeError>;

    /// Closes the node opened last.
    fn finish_node(&mut self) -> Result<(), ScribeError>;

    /// Turns the current node into a sequence of `size` elements.
    fn write_size(&mut self, size: usize) -> Result<(), ScribeError>;

    /// Turns the current node into a leaf.
    fn write_value(&mut self, value: Primitive<'_>) -> Result<(), ScribeError>;

    /// Policy for polymorphic values without an output binding.
    #[inline]
    fn unknown_types(&self) -> UnknownTypes {
        UnknownTypes::Sentinel
    }

    /// Writes `value` as the child node `name`.
    fn write_named_field<T: Scribe + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), ScribeError> {
        self.start_field(name)?;
        value.save(self)?;
        self.finish_node()
    }

    /// Writes `value` as the next element of the current sequence.
    fn write_element<T: Scribe + ?Sized>(&mut self, value: &T) -> Result<(), ScribeError> {
        self.start_element()?;
        value.save(self)?;
        self.finish_node()
    }
}

// -----------------------------------------------------------------------------
// InputArchive

/// Reads a document tree.
pub trait InputArchive: Sized + 'static {
    /// Enters the child node `name` of the current node.
    ///
    /// Fails with [`ScribeError::FieldAbsent`] if the current node has no such
    /// child, and with [`ScribeError::MalformedInput`] if it cannot have children.
    fn start_field(&mut self, name: &str) -> Result<(), ScribeError>;

    /// Enters the next element of the current sequence node.
    fn start_element(&mut self) -> Result<(), ScribeError>;

    /// Leaves the node entered last.
    fn finish_node(&mut self) -> Result<(), ScribeError>;

    /// Returns the element count of the current sequence node.
    fn read_size(&mut self) -> Result<usize, ScribeError>;

    /// Reads the current node as a leaf.
    fn read_value(&mut self) -> Result<Primitive<'static>, ScribeError>;

    /// Returns `true` if the current node is the null marker.
    fn is_null(&mut self) -> Result<bool, ScribeError>;

    /// Returns the name of the next child of the current node not yet entered,
    /// or `None` once every child has been consumed.
    fn next_field_name(&mut self) -> Result<Option<String>, ScribeError>;

    /// Loads the child node `name` into `value`.
    fn read_named_field<T: Scribe + ?Sized>(
        &mut self,
        name: &str,
        value: &mut T,
    ) -> Result<(), ScribeError> {
        self.start_field(name)?;
        value.load(self)?;
        self.finish_node()
    }

    /// Builds a new value from the child node `name`.
    fn read_new_field<T: LoadNew>(&mut self, name: &str) -> Result<T, ScribeError> {
        self.start_field(name)?;
        let value = T::load_new(self)?;
        self.finish_node()?;
        Ok(value)
    }

    /// Builds a new value from the next element of the current sequence.
    fn read_element<T: LoadNew>(&mut self) -> Result<T, ScribeError> {
        self.start_element()?;
        let value = T::load_new(self)?;
        self.finish_node()?;
        Ok(value)
    }
}
