//! Scalar entry kinds: integers, quoted strings, raw tokens and booleans.

use super::{ConfigEntry, EntryError, Value};
use std::fmt;
use std::marker::PhantomData;

/// Text format of one scalar kind
pub trait EntryKind {
    type Value: Clone + PartialEq + fmt::Debug;

    /// Human readable kind name used in error messages
    const NAME: &'static str;

    fn parse(text: &str) -> Result<Self::Value, EntryError>;

    fn serialize(value: &Self::Value) -> String;

    /// Check a loosely typed value against this kind.
    fn accept(value: Value) -> Result<Self::Value, EntryError>;
}

/// Plain decimal integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Integer;

impl EntryKind for Integer {
    type Value = i64;
    const NAME: &'static str = "integer";

    fn parse(text: &str) -> Result<i64, EntryError> {
        text.trim()
            .parse::<i64>()
            .map_err(|e| EntryError::parse(Self::NAME, text, e.to_string()))
    }

    fn serialize(value: &i64) -> String {
        value.to_string()
    }

    fn accept(value: Value) -> Result<i64, EntryError> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(EntryError::TypeMismatch {
                expected: Self::NAME,
                found: other.kind_name(),
            }),
        }
    }
}

/// String written between double quotes.
///
/// Only genuine strings are accepted: booleans and numbers are rejected
/// instead of being converted, and so are line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quoted;

impl EntryKind for Quoted {
    type Value = String;
    const NAME: &'static str = "string";

    fn parse(text: &str) -> Result<String, EntryError> {
        let inner = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .ok_or_else(|| EntryError::parse(Self::NAME, text, "value must be enclosed in double quotes"))?;
        Ok(inner.to_string())
    }

    fn serialize(value: &String) -> String {
        format!("\"{}\"", value)
    }

    fn accept(value: Value) -> Result<String, EntryError> {
        match value {
            Value::Text(s) => EntryError::check_single_line(Self::NAME, s),
            other => Err(EntryError::TypeMismatch {
                expected: Self::NAME,
                found: other.kind_name(),
            }),
        }
    }
}

/// Raw token, written and read back without any transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Untouched;

impl EntryKind for Untouched {
    type Value = String;
    const NAME: &'static str = "token";

    fn parse(text: &str) -> Result<String, EntryError> {
        Ok(text.to_string())
    }

    fn serialize(value: &String) -> String {
        value.clone()
    }

    // Any scalar is rendered through its text form.
    fn accept(value: Value) -> Result<String, EntryError> {
        EntryError::check_single_line(Self::NAME, value.to_string())
    }
}

/// Boolean flag, written as `true`/`false`; `1`/`0` are read as well
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Boolean;

impl EntryKind for Boolean {
    type Value = bool;
    const NAME: &'static str = "boolean";

    fn parse(text: &str) -> Result<bool, EntryError> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(EntryError::parse(Self::NAME, text, "expected true, false, 1 or 0")),
        }
    }

    fn serialize(value: &bool) -> String {
        value.to_string()
    }

    fn accept(value: Value) -> Result<bool, EntryError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(EntryError::TypeMismatch {
                expected: Self::NAME,
                found: other.kind_name(),
            }),
        }
    }
}

/// A scalar entry holding at most one value of kind `K`
#[derive(Clone, PartialEq)]
pub struct Entry<K: EntryKind> {
    value: Option<K::Value>,
    _kind: PhantomData<K>,
}

impl<K: EntryKind> Entry<K> {
    pub fn new() -> Self {
        Self {
            value: None,
            _kind: PhantomData,
        }
    }

    pub fn parse_from_text(&mut self, raw: &str) -> Result<(), EntryError> {
        self.value = Some(K::parse(raw)?);
        Ok(())
    }

    /// Rendered value, `None` when the entry is unset
    pub fn serialize_to_text(&self) -> Option<String> {
        self.value.as_ref().map(K::serialize)
    }

    pub fn get_value(&self) -> Option<&K::Value> {
        self.value.as_ref()
    }

    /// Assign a loosely typed value; the entry is left untouched on mismatch.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), EntryError> {
        self.value = Some(K::accept(value.into())?);
        Ok(())
    }

    pub fn set(&mut self, value: K::Value) {
        self.value = Some(value);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<K: EntryKind> Default for Entry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntryKind> fmt::Debug for Entry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &K::NAME)
            .field("value", &self.value)
            .finish()
    }
}

impl<K: EntryKind> ConfigEntry for Entry<K> {
    fn to_lines(&self) -> Vec<String> {
        self.serialize_to_text().into_iter().collect()
    }

    fn merge_from_text(&mut self, raw: &str) -> Result<(), EntryError> {
        self.parse_from_text(raw)
    }

    fn is_set(&self) -> bool {
        self.value.is_some()
    }

    fn reset(&mut self) {
        self.clear();
    }
}
