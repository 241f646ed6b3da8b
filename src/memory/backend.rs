//! OS memory calls the accessor is built on

use super::{AllocationType, FreeType, ProtectionFlags};
use crate::core::types::{Address, ErrorCode, ModuleInfo, ProcessId};

/// Raw memory operations on one target process.
///
/// Implementations report failures with the platform [`ErrorCode`] and never
/// retry. Transfers return the number of bytes actually moved, which may be
/// less than requested.
pub trait ProcessMemory {
    /// Copies target memory at `address` into `buffer`
    fn read(&self, address: Address, buffer: &mut [u8]) -> Result<usize, ErrorCode>;

    /// Copies `data` into target memory at `address`
    fn write(&self, address: Address, data: &[u8]) -> Result<usize, ErrorCode>;

    /// Allocates a region, returning its base
    fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Result<Address, ErrorCode>;

    fn free(&self, address: Address, size: usize, free_type: FreeType) -> Result<(), ErrorCode>;

    /// Sets protection of the pages covering `[address, address + size)`,
    /// returning the previous protection of the first page
    fn protect(
        &self,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> Result<ProtectionFlags, ErrorCode>;

    /// Reports for each page address whether it is backed by physical memory
    fn query_residency(&self, pages: &[Address]) -> Result<Vec<bool>, ErrorCode>;

    /// Main executable module of the target
    fn main_module(&self) -> Option<ModuleInfo>;

    fn page_size(&self) -> usize;

    fn is_alive(&self) -> bool;

    fn pid(&self) -> ProcessId;
}

impl<T: ProcessMemory + ?Sized> ProcessMemory for &T {
    fn read(&self, address: Address, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        (**self).read(address, buffer)
    }

    fn write(&self, address: Address, data: &[u8]) -> Result<usize, ErrorCode> {
        (**self).write(address, data)
    }

    fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Result<Address, ErrorCode> {
        (**self).allocate(size, allocation, protection)
    }

    fn free(&self, address: Address, size: usize, free_type: FreeType) -> Result<(), ErrorCode> {
        (**self).free(address, size, free_type)
    }

    fn protect(
        &self,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> Result<ProtectionFlags, ErrorCode> {
        (**self).protect(address, size, protection)
    }

    fn query_residency(&self, pages: &[Address]) -> Result<Vec<bool>, ErrorCode> {
        (**self).query_residency(pages)
    }

    fn main_module(&self) -> Option<ModuleInfo> {
        (**self).main_module()
    }

    fn page_size(&self) -> usize {
        (**self).page_size()
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn pid(&self) -> ProcessId {
        (**self).pid()
    }
}
