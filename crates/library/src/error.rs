//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.
//!
//! Only stage-fatal failures become errors here. Per-file problems
//! (malformed archives, unfingerprintable candidates) are logged and the
//! file dropped by the scan and index stages, so they never surface as a
//! kind of their own.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An input directory is missing or unreadable.
    Walk,
    /// Serialising or writing the fixdat failed.
    Fixdat,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fixdat)
    }
}
