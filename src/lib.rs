//! memscan: memory access, signature scanning and typed marshaling for a
//! separate target process

pub mod config;
pub mod core;
pub mod logging;
pub mod marshal;
pub mod memory;
#[cfg(windows)]
pub mod process;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use core::types::{
    Address, ErrorCode, MemoryError, MemoryOperation, MemoryResult, ModuleInfo, ProcessId,
    ScanResult,
};
pub use marshal::{layout_of, Marshal, TypeDescriptor, TypeLayout};
pub use memory::scanner::{LeaKind, MemoryPattern, Modifier, ScanOptions, SignatureSet};
pub use memory::{MemoryAccessor, MemorySnapshot, ProcessMemory};

#[cfg(windows)]
pub use process::WindowsProcess;
