//! Error types for memory access and signature scanning

use super::{Address, ErrorCode};
use std::fmt;
use thiserror::Error;

/// The OS-level operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOperation {
    Read,
    Write,
    Protect,
    Allocate,
    Free,
    QueryResidency,
}

impl fmt::Display for MemoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryOperation::Read => "read",
            MemoryOperation::Write => "write",
            MemoryOperation::Protect => "protect",
            MemoryOperation::Allocate => "allocate",
            MemoryOperation::Free => "free",
            MemoryOperation::QueryResidency => "query residency",
        };
        f.write_str(name)
    }
}

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("Could not {operation} {size} bytes at {address}: {code}")]
    AccessFailure {
        operation: MemoryOperation,
        address: Address,
        size: usize,
        code: ErrorCode,
    },

    #[error("Memory page at {0} is not backed by physical memory")]
    PageNotResident(Address),

    #[error("No string terminator within {max_size} bytes at {address}")]
    BufferTooSmall { address: Address, max_size: usize },

    #[error("Malformed pattern token '{token}': {reason}")]
    MalformedPattern { token: String, reason: String },

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Unsupported address modifier: {0}")]
    UnsupportedModifier(String),

    #[error("Process {0} has already exited")]
    ProcessExited(u32),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an access failure for an OS call
    pub fn access_failure(
        operation: MemoryOperation,
        address: Address,
        size: usize,
        code: ErrorCode,
    ) -> Self {
        MemoryError::AccessFailure {
            operation,
            address,
            size,
            code,
        }
    }

    /// Creates an invalid argument error
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        MemoryError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Creates a malformed pattern error
    pub fn malformed_pattern(token: impl Into<String>, reason: impl Into<String>) -> Self {
        MemoryError::MalformedPattern {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Platform error code carried by the error, if any
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            MemoryError::AccessFailure { code, .. } => Some(*code),
            _ => None,
        }
    }
}
