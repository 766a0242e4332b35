//! Error classification shared by every boundary.
//!
//! Each boundary owns its own error enum (`CommandError`, `ResultSetError`,
//! `RepositoryError`, ...). They all report an [`ErrorKind`] so callers can
//! decide whether to retry, abort, or report to a user without matching on
//! every concrete variant.

use std::fmt;

/// Stable machine-readable category describing a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An illegal command parameter or value. Caller programming error.
    Validation,
    /// The transport or server rejected the exchange, or returned a
    /// non-success error code. May be transient.
    Protocol,
    /// The server reported a field whose type cannot be determined.
    UnknownField,
    /// A value or record could not be decoded.
    Parse,
    /// The repository was used incorrectly.
    Domain,
    /// The server returned no record where one was structurally required.
    InvalidResult,
    /// A hydration, extraction, or field-type conversion failed.
    Mapping,
    /// Client-side configuration is missing or invalid.
    Configuration,
}

impl ErrorKind {
    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// # Examples
    /// ```
    /// use fmclient::domain::ErrorKind;
    ///
    /// assert!(ErrorKind::Protocol.is_retryable());
    /// assert!(!ErrorKind::Validation.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Protocol)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Protocol => "protocol",
            Self::UnknownField => "unknown_field",
            Self::Parse => "parse",
            Self::Domain => "domain",
            Self::InvalidResult => "invalid_result",
            Self::Mapping => "mapping",
            Self::Configuration => "configuration",
        };
        f.write_str(label)
    }
}
