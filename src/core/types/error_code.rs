//! Platform error codes reported by the OS memory calls

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes surfaced by [`ProcessMemory`](crate::memory::ProcessMemory) implementations.
///
/// The numeric values follow the Win32 error space so codes coming from the
/// Windows backend round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    AccessDenied,
    InvalidHandle,
    InvalidParameter,
    InsufficientBuffer,
    PartialCopy,
    InvalidAddress,
    NoAccess,
    Unknown(u32),
}

impl ErrorCode {
    /// Raw numeric value of the code
    pub fn raw(&self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::AccessDenied => 5,
            ErrorCode::InvalidHandle => 6,
            ErrorCode::InvalidParameter => 87,
            ErrorCode::InsufficientBuffer => 122,
            ErrorCode::PartialCopy => 299,
            ErrorCode::InvalidAddress => 487,
            ErrorCode::NoAccess => 998,
            ErrorCode::Unknown(code) => *code,
        }
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            0 => ErrorCode::Success,
            5 => ErrorCode::AccessDenied,
            6 => ErrorCode::InvalidHandle,
            87 => ErrorCode::InvalidParameter,
            122 => ErrorCode::InsufficientBuffer,
            299 => ErrorCode::PartialCopy,
            487 => ErrorCode::InvalidAddress,
            998 => ErrorCode::NoAccess,
            _ => ErrorCode::Unknown(code),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Success => write!(f, "Success"),
            ErrorCode::AccessDenied => write!(f, "Access denied"),
            ErrorCode::InvalidHandle => write!(f, "Invalid handle"),
            ErrorCode::InvalidParameter => write!(f, "Invalid parameter"),
            ErrorCode::InsufficientBuffer => write!(f, "Insufficient buffer"),
            ErrorCode::PartialCopy => write!(f, "Partial copy"),
            ErrorCode::InvalidAddress => write!(f, "Invalid address"),
            ErrorCode::NoAccess => write!(f, "Invalid access to memory location"),
            ErrorCode::Unknown(code) => write!(f, "Unknown error: {}", code),
        }
    }
}
