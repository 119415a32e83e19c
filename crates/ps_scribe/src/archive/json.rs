//! JSON archives over [`serde_json::Value`].
//!
//! Object keys keep the order they were written in. Entering a field on input
//! removes it from its parent object, so [`InputArchive::next_field_name`]
//! always yields the first field not yet read.
//!
//! # Examples
//!
//! ```
//! use ps_scribe::archive::json;
//!
//! let text = json::to_string(&vec![1_u8, 2, 3]).unwrap();
//! assert_eq!(text, "[1,2,3]");
//!
//! let back: Vec<u8> = json::from_str(&text).unwrap();
//! assert_eq!(back, [1, 2, 3]);
//! ```

use alloc::vec;
use core::mem;

use serde_json::{Map, Number, Value};

use crate::archive::{InputArchive, OutputArchive, Primitive, UnknownTypes};
use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// JsonOptions

/// Options of a [`JsonOutputArchive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indent the text produced by [`JsonOutputArchive::into_string`].
    pub pretty: bool,
    /// Handling of polymorphic values without an output binding.
    pub unknown_types: UnknownTypes,
}

impl JsonOptions {
    #[inline]
    pub const fn pretty() -> Self {
        Self {
            pretty: true,
            unknown_types: UnknownTypes::Sentinel,
        }
    }

    #[inline]
    pub const fn with_unknown_types(mut self, unknown_types: UnknownTypes) -> Self {
        self.unknown_types = unknown_types;
        self
    }
}

// -----------------------------------------------------------------------------
// JsonOutputArchive

enum OutNode {
    // Nothing written yet; closes as an empty object.
    Pending,
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Leaf(Value),
}

impl OutNode {
    fn into_value(self) -> Value {
        match self {
            OutNode::Pending => Value::Object(Map::new()),
            OutNode::Object(map) => Value::Object(map),
            OutNode::Array(items) => Value::Array(items),
            OutNode::Leaf(value) => value,
        }
    }
}

struct OutFrame {
    key: Option<String>,
    node: OutNode,
}

/// Builds a [`Value`] tree.
pub struct JsonOutputArchive {
    stack: Vec<OutFrame>,
    options: JsonOptions,
}

impl Default for JsonOutputArchive {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputArchive {
    #[inline]
    pub fn new() -> Self {
        Self::with_options(JsonOptions::default())
    }

    pub fn with_options(options: JsonOptions) -> Self {
        Self {
            stack: vec![OutFrame {
                key: None,
                node: OutNode::Pending,
            }],
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    /// Returns the finished tree.
    ///
    /// Fails if a node opened with `start_field` or `start_element` is still open.
    pub fn into_value(mut self) -> Result<Value, ScribeError> {
        if self.stack.len() != 1 {
            return Err(ScribeError::unrepresentable(format!(
                "{} node(s) left open",
                self.stack.len().saturating_sub(1)
            )));
        }
        match self.stack.pop() {
            Some(frame) => Ok(frame.node.into_value()),
            None => Err(ScribeError::unrepresentable("archive has no root node")),
        }
    }

    /// Returns the finished tree as text, indented if [`JsonOptions::pretty`] is set.
    pub fn into_string(self) -> Result<String, ScribeError> {
        let pretty = self.options.pretty;
        let value = self.into_value()?;
        let text = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    fn top(&mut self) -> Result<&mut OutFrame, ScribeError> {
        self.stack
            .last_mut()
            .ok_or_else(|| ScribeError::unrepresentable("archive has no open node"))
    }

    fn leaf(value: Primitive<'_>) -> Result<Value, ScribeError> {
        Ok(match value {
            Primitive::Null => Value::Null,
            Primitive::Bool(v) => Value::Bool(v),
            Primitive::Int(v) => Value::from(v),
            Primitive::UInt(v) => Value::from(v),
            Primitive::Float(v) => Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| ScribeError::unrepresentable(format!("non-finite float {v}")))?,
            Primitive::Str(v) => Value::String(v.into_owned()),
        })
    }
}

impl OutputArchive for JsonOutputArchive {
    fn start_field(&mut self, name: &str) -> Result<(), ScribeError> {
        let frame = self.top()?;
        match frame.node {
            OutNode::Pending => frame.node = OutNode::Object(Map::new()),
            OutNode::Object(_) => {}
            _ => {
                return Err(ScribeError::unrepresentable(format!(
                    "field `{name}` written into a node that is not an object"
                )));
            }
        }
        self.stack.push(OutFrame {
            key: Some(name.into()),
            node: OutNode::Pending,
        });
        Ok(())
    }

    fn start_element(&mut self) -> Result<(), ScribeError> {
        if !matches!(self.top()?.node, OutNode::Array(_)) {
            return Err(ScribeError::unrepresentable(
                "element written into a node that is not a sequence",
            ));
        }
        self.stack.push(OutFrame {
            key: None,
            node: OutNode::Pending,
        });
        Ok(())
    }

    fn finish_node(&mut self) -> Result<(), ScribeError> {
        if self.stack.len() < 2 {
            return Err(ScribeError::unrepresentable("no open node to finish"));
        }
        let Some(OutFrame { key, node }) = self.stack.pop() else {
            return Err(ScribeError::unrepresentable("no open node to finish"));
        };
        let value = node.into_value();
        match (&mut self.top()?.node, key) {
            (OutNode::Object(map), Some(key)) => {
                if map.contains_key(&key) {
                    return Err(ScribeError::unrepresentable(format!(
                        "field `{key}` written twice into one object"
                    )));
                }
                map.insert(key, value);
            }
            (OutNode::Array(items), None) => items.push(value),
            _ => return Err(ScribeError::unrepresentable("unbalanced node nesting")),
        }
        Ok(())
    }

    fn write_size(&mut self, size: usize) -> Result<(), ScribeError> {
        let frame = self.top()?;
        match frame.node {
            OutNode::Pending => {
                frame.node = OutNode::Array(Vec::with_capacity(size));
                Ok(())
            }
            _ => Err(ScribeError::unrepresentable(
                "sequence written into a node that already has content",
            )),
        }
    }

    fn write_value(&mut self, value: Primitive<'_>) -> Result<(), ScribeError> {
        let leaf = Self::leaf(value)?;
        let frame = self.top()?;
        match frame.node {
            OutNode::Pending => {
                frame.node = OutNode::Leaf(leaf);
                Ok(())
            }
            _ => Err(ScribeError::unrepresentable(
                "value written into a node that already has content",
            )),
        }
    }

    #[inline]
    fn unknown_types(&self) -> UnknownTypes {
        self.options.unknown_types
    }
}

// -----------------------------------------------------------------------------
// JsonInputArchive

enum InNode {
    Value(Value),
    Object(Map<String, Value>),
    Array {
        items: vec::IntoIter<Value>,
        len: usize,
    },
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads a [`Value`] tree.
pub struct JsonInputArchive {
    stack: Vec<InNode>,
}

impl JsonInputArchive {
    pub fn from_value(value: Value) -> Self {
        Self {
            stack: vec![InNode::Value(value)],
        }
    }

    /// Parses `text` and reads from its root.
    pub fn parse(text: &str) -> Result<Self, ScribeError> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    fn top(&mut self) -> Result<&mut InNode, ScribeError> {
        self.stack
            .last_mut()
            .ok_or_else(|| ScribeError::malformed("archive has no current node"))
    }

    fn object(&mut self) -> Result<&mut Map<String, Value>, ScribeError> {
        let node = self.top()?;
        if let InNode::Value(value @ Value::Object(_)) = node
            && let Value::Object(map) = mem::take(value)
        {
            *node = InNode::Object(map);
        }
        match node {
            InNode::Object(map) => Ok(map),
            InNode::Value(value) => Err(ScribeError::malformed(format!(
                "expected an object, found {}",
                value_kind(value)
            ))),
            InNode::Array { .. } => Err(ScribeError::malformed("expected an object, found array")),
        }
    }

    fn array(&mut self) -> Result<(&mut vec::IntoIter<Value>, usize), ScribeError> {
        let node = self.top()?;
        if let InNode::Value(value @ Value::Array(_)) = node
            && let Value::Array(items) = mem::take(value)
        {
            let len = items.len();
            *node = InNode::Array {
                items: items.into_iter(),
                len,
            };
        }
        match node {
            InNode::Array { items, len } => Ok((items, *len)),
            InNode::Value(value) => Err(ScribeError::malformed(format!(
                "expected an array, found {}",
                value_kind(value)
            ))),
            InNode::Object(_) => Err(ScribeError::malformed("expected an array, found object")),
        }
    }
}

impl InputArchive for JsonInputArchive {
    fn start_field(&mut self, name: &str) -> Result<(), ScribeError> {
        let value = self
            .object()?
            .shift_remove(name)
            .ok_or_else(|| ScribeError::FieldAbsent { name: name.into() })?;
        self.stack.push(InNode::Value(value));
        Ok(())
    }

    fn start_element(&mut self) -> Result<(), ScribeError> {
        let (items, _) = self.array()?;
        let value = items
            .next()
            .ok_or_else(|| ScribeError::malformed("sequence has no more elements"))?;
        self.stack.push(InNode::Value(value));
        Ok(())
    }

    fn finish_node(&mut self) -> Result<(), ScribeError> {
        if self.stack.len() < 2 {
            return Err(ScribeError::malformed("no open node to finish"));
        }
        self.stack.pop();
        Ok(())
    }

    fn read_size(&mut self) -> Result<usize, ScribeError> {
        self.array().map(|(_, len)| len)
    }

    fn read_value(&mut self) -> Result<Primitive<'static>, ScribeError> {
        let InNode::Value(value) = self.top()? else {
            return Err(ScribeError::malformed("expected a value, found a container"));
        };
        match mem::take(value) {
            Value::Null => Ok(Primitive::Null),
            Value::Bool(v) => Ok(Primitive::Bool(v)),
            Value::String(v) => Ok(Primitive::Str(v.into())),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Primitive::Int(v))
                } else if let Some(v) = n.as_u64() {
                    Ok(Primitive::UInt(v))
                } else {
                    n.as_f64()
                        .map(Primitive::Float)
                        .ok_or_else(|| ScribeError::malformed(format!("unreadable number {n}")))
                }
            }
            other => {
                let kind = value_kind(&other);
                *value = other;
                Err(ScribeError::malformed(format!(
                    "expected a value, found {kind}"
                )))
            }
        }
    }

    fn is_null(&mut self) -> Result<bool, ScribeError> {
        Ok(matches!(self.top()?, InNode::Value(Value::Null)))
    }

    fn next_field_name(&mut self) -> Result<Option<String>, ScribeError> {
        Ok(self.object()?.keys().next().cloned())
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Saves `value` as a [`Value`] tree.
pub fn to_value<T: Scribe + ?Sized>(value: &T) -> Result<Value, ScribeError> {
    to_value_with(value, JsonOptions::default())
}

/// Saves `value` as a [`Value`] tree with the given options.
pub fn to_value_with<T: Scribe + ?Sized>(
    value: &T,
    options: JsonOptions,
) -> Result<Value, ScribeError> {
    let mut ar = JsonOutputArchive::with_options(options);
    value.save(&mut ar)?;
    ar.into_value()
}

/// Saves `value` as compact JSON text.
pub fn to_string<T: Scribe + ?Sized>(value: &T) -> Result<String, ScribeError> {
    to_string_with(value, JsonOptions::default())
}

/// Saves `value` as indented JSON text.
pub fn to_string_pretty<T: Scribe + ?Sized>(value: &T) -> Result<String, ScribeError> {
    to_string_with(value, JsonOptions::pretty())
}

/// Saves `value` as JSON text with the given options.
pub fn to_string_with<T: Scribe + ?Sized>(
    value: &T,
    options: JsonOptions,
) -> Result<String, ScribeError> {
    let mut ar = JsonOutputArchive::with_options(options);
    value.save(&mut ar)?;
    ar.into_string()
}

/// Builds a `T` from a [`Value`] tree.
pub fn from_value<T: LoadNew>(value: Value) -> Result<T, ScribeError> {
    T::load_new(&mut JsonInputArchive::from_value(value))
}

/// Builds a `T` from JSON text.
pub fn from_str<T: LoadNew>(text: &str) -> Result<T, ScribeError> {
    T::load_new(&mut JsonInputArchive::parse(text)?)
}

// -----------------------------------------------------------------------------
// Tests
