//! Typed error surface for the mining core.
//!
//! The corpus this crate is grown from never reaches for `thiserror`; domain
//! errors here are plain enums with a hand-written `Display`/`Error` impl,
//! the same way the teacher crate keeps `anyhow` at I/O boundaries (see
//! [`crate::persistence`]) and a typed enum for everything a caller needs to
//! match on.

use std::fmt;

/// Condition raised by a [`crate::store::LogStore`] when its backing table
/// is empty or has never been written.
#[derive(Debug)]
pub enum StoreError {
    /// The distinguished *NoSuchLogData* condition from spec §6/§7: the
    /// store has nothing to return yet. Recovered locally wherever it's
    /// expected (the event catalog load in [`crate::output::OutputAssembler`]).
    NoSuchLogData,
    /// Any other backend failure (I/O, serialization, ...), propagated
    /// unchanged to the caller.
    Backend(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoSuchLogData => write!(f, "no log data available"),
            StoreError::Backend(e) => write!(f, "store operation failed: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NoSuchLogData => None,
            StoreError::Backend(e) => Some(e.as_ref()),
        }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Backend(e)
    }
}

/// Errors surfaced by the core to a caller. `FormatMismatch` is deliberately
/// absent: per spec §7 a line that fails to match the log format is
/// skipped silently and never reaches this type.
#[derive(Debug)]
pub enum DrainError {
    /// Fatal, checked before any parsing begins: `depth < 3`, `st` outside
    /// `[0, 1]`, or an empty format pattern.
    InvalidConfiguration(String),
    /// A log store's `get`/`save` failed; wraps the store's own error.
    Store(StoreError),
    /// Reading a line from the line source failed.
    Io(std::io::Error),
}

impl fmt::Display for DrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            DrainError::Store(e) => write!(f, "store failure: {e}"),
            DrainError::Io(e) => write!(f, "failed to read input line: {e}"),
        }
    }
}

impl std::error::Error for DrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DrainError::InvalidConfiguration(_) => None,
            DrainError::Store(e) => Some(e),
            DrainError::Io(e) => Some(e),
        }
    }
}

impl From<StoreError> for DrainError {
    fn from(e: StoreError) -> Self {
        DrainError::Store(e)
    }
}

impl From<std::io::Error> for DrainError {
    fn from(e: std::io::Error) -> Self {
        DrainError::Io(e)
    }
}
