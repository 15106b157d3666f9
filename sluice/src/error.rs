//! Error types for sluice.

use thiserror::Error;

/// Result type alias using sluice's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or running a pipeline.
///
/// Cancellation is never an error: a cancelled stream simply ends.
#[derive(Error, Debug)]
pub enum Error {
    /// A bounded combinator was asked for zero capacity, or more than it can allocate.
    #[error("capacity must be between 1 and {}, got {0}", crate::operators::buffer::MAX_CAPACITY)]
    InvalidCapacity(usize),

    /// An untyped value did not hold the type requested of it.
    #[error("type mismatch at element {index}: expected {expected}")]
    TypeMismatch {
        /// Name of the requested type.
        expected: &'static str,
        /// Position of the offending element in the stream.
        index: usize,
    },

    /// The operating system refused a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// Unusable configuration arguments.
    #[error("invalid configuration: {0}")]
    Config(String),
}
