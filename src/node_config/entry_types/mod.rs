//! Typed entries of the node configuration file.
//!
//! Every entry knows how to parse itself from the text found on the right
//! hand side of a `key = value` line and how to render itself back. Scalar
//! entries hold at most one value, [`List`] holds an ordered sequence of
//! values of one scalar kind.

pub mod list;
pub mod scalar;
pub mod value;

use std::fmt;

pub use list::{List, ListFormat, Rendered};
pub use scalar::{Boolean, Entry, EntryKind, Integer, Quoted, Untouched};
pub use value::Value;

/// Errors raised while parsing or assigning entry values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryError {
    #[error("Cannot parse {text:?} as {kind}: {reason}")]
    Parse {
        kind: &'static str,
        text: String,
        reason: String,
    },

    #[error("Expected {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Values are written on one `key = value` line
    #[error("{kind} value {text:?} contains a line break")]
    LineBreak { kind: &'static str, text: String },
}

impl EntryError {
    /// Reject `text` when it would not stay on a single line
    pub(crate) fn check_single_line(kind: &'static str, text: String) -> Result<String, Self> {
        if text.contains(['\n', '\r']) {
            return Err(EntryError::LineBreak { kind, text });
        }
        Ok(text)
    }

    pub(crate) fn parse(kind: &'static str, text: &str, reason: impl Into<String>) -> Self {
        EntryError::Parse {
            kind,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Object-safe view of an entry, used by `NodeConfig` to walk its schema.
pub trait ConfigEntry: fmt::Debug {
    /// Rendered values, one per output line. Empty when nothing is set.
    fn to_lines(&self) -> Vec<String>;

    /// Absorb one occurrence of the key read from a file.
    ///
    /// Scalars keep the last value, lists accumulate.
    fn merge_from_text(&mut self, raw: &str) -> Result<(), EntryError>;

    fn is_set(&self) -> bool;

    fn reset(&mut self);
}
