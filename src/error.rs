// Copyright (c) 2024 Mike Tsao

//! The error type shared by every fallible operation in the crate.

use thiserror::Error as ThisError;

/// Everything that can go wrong while building or rendering a signal.
///
/// All of these are deterministic. Nothing is retried: once a realize pass
/// fails, the caller fixes the expression and renders again.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    /// A constructor or operation received a malformed or out-of-range
    /// parameter (negative duration, ratio outside (0, 1], zero step, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two buffers with incompatible channel counts were combined. Mono
    /// buffers never cause this, because they broadcast.
    #[error("channel mismatch: expected {expected} channels, found {found}")]
    ChannelMismatch {
        #[allow(missing_docs)]
        expected: usize,
        #[allow(missing_docs)]
        found: usize,
    },

    /// Raw sample data that can't be interpreted as a channels-by-time matrix.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// An internal invariant was broken, such as a transform leaving channels
    /// of unequal length. This is a bug in the transform, not in the input.
    #[error("shape invariant violated: {0}")]
    ShapeInvariantViolation(String),

    /// The operation is meaningless for this value.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The requested sample encoding isn't one we can produce.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Shorthand for results produced by this crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Convenience constructor for [Error::InvalidArgument].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
