//! Process handle with RAII semantics

use crate::core::types::{ErrorCode, MemoryError, MemoryResult, ProcessId};
use crate::windows::bindings::kernel32;
use crate::windows::types::Handle;
use std::fmt;
use winapi::um::winnt::HANDLE;

/// Access rights for process handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Query information access
    pub const QUERY_INFORMATION: Self = Self { value: 0x0400 };
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Allocate, free and protect memory
    pub const VM_OPERATION: Self = Self { value: 0x0008 };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let value = rights.iter().fold(0, |acc, right| acc | right.value);
        Self { value }
    }

    /// Everything the memory accessor needs
    pub fn memory_access() -> Self {
        Self::combine(&[
            Self::QUERY_INFORMATION,
            Self::VM_READ,
            Self::VM_WRITE,
            Self::VM_OPERATION,
        ])
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// An open handle to a target process
pub struct ProcessHandle {
    handle: Handle,
    pid: ProcessId,
}

impl ProcessHandle {
    /// Open a process with specified access rights
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        let raw = kernel32::open_process(pid, access.value()).map_err(|code| match code {
            ErrorCode::InvalidParameter => MemoryError::ProcessNotFound(format!("PID {}", pid)),
            code => MemoryError::InvalidHandle(format!("OpenProcess({}) failed: {}", pid, code)),
        })?;

        let handle = Handle::from_raw(raw)
            .ok_or_else(|| MemoryError::InvalidHandle(format!("OpenProcess({}) returned null", pid)))?;

        Ok(ProcessHandle { handle, pid })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// The raw handle, valid while `self` lives
    pub fn raw(&self) -> HANDLE {
        self.handle.raw()
    }

    /// Whether the process has not yet exited
    pub fn is_alive(&self) -> bool {
        matches!(
            unsafe { kernel32::get_exit_code_process(self.raw()) },
            Ok(kernel32::STILL_ACTIVE)
        )
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("handle", &self.raw())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_combine() {
        let access = ProcessAccess::combine(&[ProcessAccess::VM_READ, ProcessAccess::VM_WRITE]);
        assert_eq!(access.value(), 0x0030);
        assert_eq!(ProcessAccess::memory_access().value(), 0x0438);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_pid() {
        let result = ProcessHandle::open(0, ProcessAccess::memory_access());
        assert!(matches!(result, Err(MemoryError::ProcessNotFound(_))));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_self() {
        let handle = ProcessHandle::open(std::process::id(), ProcessAccess::QUERY_INFORMATION)
            .unwrap();
        assert_eq!(handle.pid(), std::process::id());
        assert!(handle.is_alive());
    }
}
