#![forbid(unsafe_code)]

//! Errors from flag store operations.

use std::fmt;

/// Errors from [`FlagStore`](crate::FlagStore) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// A key outside the store's initial key set was used.
    ///
    /// `key` holds the `Debug` rendering of the offending key.
    UnknownKey { key: String },
}

impl FlagError {
    pub(crate) fn unknown_key(key: &impl fmt::Debug) -> Self {
        Self::UnknownKey {
            key: format!("{key:?}"),
        }
    }
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey { key } => write!(f, "unknown flag key: {key}"),
        }
    }
}

impl std::error::Error for FlagError {}

/// Result alias for flag store operations.
pub type FlagResult<T = ()> = Result<T, FlagError>;
