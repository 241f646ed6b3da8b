//! [`ProcessMemory`] over a live Windows process

use super::{enumerate_modules, ProcessAccess, ProcessHandle};
use crate::core::types::{Address, ErrorCode, MemoryResult, ModuleInfo, ProcessId};
use crate::memory::{AllocationType, FreeType, MemoryAccessor, ProcessMemory, ProtectionFlags};
use crate::windows::bindings::{kernel32, psapi};
use tracing::{debug, warn};

/// A target process opened for memory access
#[derive(Debug)]
pub struct WindowsProcess {
    handle: ProcessHandle,
    main_module: Option<ModuleInfo>,
    page_size: usize,
}

impl WindowsProcess {
    /// Opens `pid` with the rights the accessor needs
    pub fn open(pid: ProcessId) -> MemoryResult<Self> {
        let handle = ProcessHandle::open(pid, ProcessAccess::memory_access())?;

        let main_module = match enumerate_modules(&handle) {
            Ok(modules) => modules.into_iter().next(),
            Err(code) => {
                warn!("Failed to enumerate modules of process {}: {}", pid, code);
                None
            }
        };

        debug!(
            "Opened process {} (main module {:?})",
            pid,
            main_module.as_ref().map(|module| module.name.as_str())
        );

        Ok(WindowsProcess {
            handle,
            main_module,
            page_size: kernel32::system_page_size(),
        })
    }

    /// All modules currently loaded in the target
    pub fn modules(&self) -> Result<Vec<ModuleInfo>, ErrorCode> {
        enumerate_modules(&self.handle)
    }

    /// Finds a loaded module by name, ignoring ASCII case
    pub fn find_module(&self, name: &str) -> Result<Option<ModuleInfo>, ErrorCode> {
        Ok(self
            .modules()?
            .into_iter()
            .find(|module| module.name.eq_ignore_ascii_case(name)))
    }
}

impl ProcessMemory for WindowsProcess {
    fn read(&self, address: Address, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        unsafe { kernel32::read_process_memory(self.handle.raw(), address.as_usize(), buffer) }
    }

    fn write(&self, address: Address, data: &[u8]) -> Result<usize, ErrorCode> {
        unsafe { kernel32::write_process_memory(self.handle.raw(), address.as_usize(), data) }
    }

    fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Result<Address, ErrorCode> {
        unsafe {
            kernel32::virtual_alloc_ex(self.handle.raw(), size, allocation.raw(), protection.raw())
                .map(Address::new)
        }
    }

    fn free(&self, address: Address, size: usize, free_type: FreeType) -> Result<(), ErrorCode> {
        unsafe {
            kernel32::virtual_free_ex(self.handle.raw(), address.as_usize(), size, free_type.raw())
        }
    }

    fn protect(
        &self,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> Result<ProtectionFlags, ErrorCode> {
        unsafe {
            kernel32::virtual_protect_ex(
                self.handle.raw(),
                address.as_usize(),
                size,
                protection.raw(),
            )
            .map(ProtectionFlags::new)
        }
    }

    fn query_residency(&self, pages: &[Address]) -> Result<Vec<bool>, ErrorCode> {
        let pages: Vec<usize> = pages.iter().map(Address::as_usize).collect();
        unsafe { psapi::query_working_set_ex(self.handle.raw(), &pages) }
    }

    fn main_module(&self) -> Option<ModuleInfo> {
        self.main_module.clone()
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    fn pid(&self) -> ProcessId {
        self.handle.pid()
    }
}

impl MemoryAccessor<WindowsProcess> {
    /// Opens a live process and wraps it in an accessor
    pub fn attach(pid: ProcessId) -> MemoryResult<Self> {
        MemoryAccessor::new(WindowsProcess::open(pid)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_attach_self_and_read() {
        let accessor = MemoryAccessor::attach(std::process::id()).unwrap();
        assert!(!accessor.image_base().is_null());

        let value: u64 = 0x1122_3344_5566_7788;
        let address = Address::new(&value as *const u64 as usize);
        assert_eq!(accessor.read_value::<u64>(address).unwrap(), value);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_allocate_write_free_in_self() {
        let accessor = MemoryAccessor::attach(std::process::id()).unwrap();
        let address = accessor.allocate(
            100,
            AllocationType::commit_reserve(),
            ProtectionFlags::read_write(),
        );
        assert!(!address.is_null());

        accessor.write_bytes(address, b"hello\0").unwrap();
        assert_eq!(accessor.read_string(address, 100).unwrap(), "hello");
        accessor.release(address).unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_residency_of_touched_page() {
        let value = [1u8; 64];
        let address = Address::new(value.as_ptr() as usize);
        let process = WindowsProcess::open(std::process::id()).unwrap();
        let page = address.align_down(process.page_size());
        assert_eq!(process.query_residency(&[page]).unwrap(), vec![true]);
    }
}
