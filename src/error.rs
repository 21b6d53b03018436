//! Error handling.

use core::fmt;

/// An enumeration of the failures reported by secure buffer operations.
///
/// Every variant maps to a fixed numeric code shared with the C interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// A required handle or data pointer was missing
    #[error("NULL pointer provided")]
    NullPointer,
    /// A size or length argument was zero or exceeded the buffer size
    #[error("Invalid size parameter")]
    InvalidSize,
    /// The operating system could not provide the memory pages
    #[error("Memory allocation failed")]
    AllocationFailed,
    /// The memory pages could not be pinned in physical memory
    #[error("Failed to lock memory in RAM")]
    LockFailed,
    /// The page protection mode could not be changed
    #[error("Failed to set memory protection")]
    ProtectFailed,
}

/// Result type for secure buffer operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Numeric code reported for a successful operation.
pub const SUCCESS_CODE: i32 = 0;

const SUCCESS_STR: &str = "Success";
const UNKNOWN_STR: &str = "Unknown error";

impl Error {
    /// All error variants, in code order.
    pub const ALL: [Error; 5] = [
        Self::NullPointer,
        Self::AllocationFailed,
        Self::LockFailed,
        Self::ProtectFailed,
        Self::InvalidSize,
    ];

    /// Generic description of this error
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NullPointer => "NULL pointer provided",
            Self::InvalidSize => "Invalid size parameter",
            Self::AllocationFailed => "Memory allocation failed",
            Self::LockFailed => "Failed to lock memory in RAM",
            Self::ProtectFailed => "Failed to set memory protection",
        }
    }

    /// The stable numeric code for this error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::NullPointer => -1,
            Self::AllocationFailed => -2,
            Self::LockFailed => -3,
            Self::ProtectFailed => -4,
            Self::InvalidSize => -5,
        }
    }

    /// Look up the error for a numeric code. Returns `None` for the
    /// success code and for unrecognized values.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::NullPointer),
            -2 => Some(Self::AllocationFailed),
            -3 => Some(Self::LockFailed),
            -4 => Some(Self::ProtectFailed),
            -5 => Some(Self::InvalidSize),
            _ => None,
        }
    }
}

/// Describe a numeric result code. Never returns an empty string.
pub const fn error_string(code: i32) -> &'static str {
    if code == SUCCESS_CODE {
        return SUCCESS_STR;
    }
    match Error::from_code(code) {
        Some(err) => err.as_str(),
        None => UNKNOWN_STR,
    }
}

/// An error which may result from a low-level page operation such as
/// locking or changing the protection mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryError;

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Memory error")
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{error_string, Error, SUCCESS_CODE};

    #[rstest]
    #[case(Error::NullPointer, -1)]
    #[case(Error::AllocationFailed, -2)]
    #[case(Error::LockFailed, -3)]
    #[case(Error::ProtectFailed, -4)]
    #[case(Error::InvalidSize, -5)]
    fn code_mapping(#[case] err: Error, #[case] code: i32) {
        assert_eq!(err.code(), code);
        assert_eq!(Error::from_code(code), Some(err));
        assert_eq!(error_string(code), err.as_str());
        assert_eq!(err.to_string(), err.as_str());
    }

    #[test]
    fn strings_never_empty() {
        assert_eq!(error_string(SUCCESS_CODE), "Success");
        assert_eq!(error_string(-99), "Unknown error");
        assert_eq!(error_string(i32::MAX), "Unknown error");
        for err in Error::ALL {
            assert!(!err.as_str().is_empty());
        }
    }
}
