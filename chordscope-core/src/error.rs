//! # Error Module
//!
//! Error type shared by every analysis entry point in the core crate.
//! Capacity errors (`Overflow` / `Underflow`) are pacing events between the
//! audio callbacks and are meant to be retried or discarded by the caller.
//! "No confident answer" outcomes are never errors: they come back as
//! `Ok(0.0)` or `Ok(None)` from the functions that produce them.

/// Crate-level error type for the chordscope analysis core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A caller supplied an argument that violates a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value falls outside the domain an operation accepts.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Not enough free slots in the audio queue for a push.
    #[error("audio queue overflow: {requested} samples requested, {free} free")]
    Overflow { requested: usize, free: usize },

    /// Not enough data in the audio queue for a read.
    #[error("audio queue underflow: {requested} samples requested, {available} available")]
    Underflow { requested: usize, available: usize },

    /// An internal table is in a state that should be impossible.
    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// True for queue overflow/underflow, which callers treat as transient.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::Overflow { .. } | Error::Underflow { .. })
    }
}

/// Convenience Result type for chordscope operations.
pub type Result<T> = std::result::Result<T, Error>;
