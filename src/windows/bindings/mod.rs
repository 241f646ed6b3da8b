//! Windows API bindings
//!
//! Thin wrappers over kernel32 and psapi returning [`ErrorCode`](crate::core::types::ErrorCode).

pub mod kernel32;
pub mod psapi;

pub use kernel32::*;
pub use psapi::*;
