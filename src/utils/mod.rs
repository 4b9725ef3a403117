//! Shared utilities: executable resolution and variable expansion.

pub mod binary;
pub mod expand;

pub use binary::{validate_binary, BinaryError, PathsToExecutables};
pub use expand::{expand_env, expand_variables};
