//! Error types.

use std::fmt::{self, Display};

use crate::validate::ValidationReport;

/// An error returned when building a font or dumping an individual table.
#[derive(Debug, Clone)]
pub enum Error {
    /// A table failed validation before encoding.
    ValidationFailed(ValidationReport),
    /// A value could not be represented in its wire format.
    EncodingFailed(EncodeError),
}

/// A value that does not fit its target representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A computed offset exceeded the range of a 16-bit offset field.
    OffsetOverflow {
        field: &'static str,
        value: usize,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ValidationFailed(report) => report.fmt(f),
            Error::EncodingFailed(err) => err.fmt(f),
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::OffsetOverflow { field, value } => {
                write!(f, "offset '{field}' ({value}) exceeds u16::MAX")
            }
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for EncodeError {}

impl From<ValidationReport> for Error {
    fn from(src: ValidationReport) -> Self {
        Error::ValidationFailed(src)
    }
}

impl From<EncodeError> for Error {
    fn from(src: EncodeError) -> Self {
        Error::EncodingFailed(src)
    }
}
