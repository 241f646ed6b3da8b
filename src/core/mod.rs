//! Core module containing fundamental types for memscan
//!
//! This module provides the foundational building blocks used throughout
//! the crate: address handling, module descriptions, scan results and
//! error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{Address, ErrorCode, MemoryError, MemoryResult, ModuleInfo, ScanResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
