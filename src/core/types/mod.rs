//! Core type definitions for memscan
//!
//! Address wrappers, module descriptions, scan results and error types shared
//! by the accessor, the marshaling layer and the scanner.

mod address;
mod error;
mod error_code;
mod module_info;
mod scan_result;

// Re-export all public types
pub use address::Address;
pub use error::{MemoryError, MemoryOperation, MemoryResult};
pub use error_code::ErrorCode;
pub use module_info::ModuleInfo;
pub use scan_result::ScanResult;

// Common type aliases
pub type ProcessId = u32;
pub type Size = usize;
