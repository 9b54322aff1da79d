//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Kinds describe what the caller should *do* about the
//! failure, not what went wrong internally.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The archive could not be opened or walked; the underlying library
    /// error is logged at the raise site.
    #[display("malformed archive: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// The named entry is not present in the archive it was expected in
    #[display("entry not found in archive: {}", _0.display())]
    EntryMissing(#[error(not(source))] PathBuf),
    /// A blocking worker task died before reporting a result
    #[display("background task failed")]
    Task,
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Task)
    }
}
