//! Shared fixtures for integration tests

#![allow(dead_code)]

use memscan::memory::{AllocationType, FreeType, ProcessMemory, ProtectionFlags};
use memscan::{Address, ErrorCode, MemorySnapshot, ModuleInfo, ProcessId};
use std::cell::Cell;

pub const MODULE_BASE: Address = Address::new(0x40_0000);

/// Snapshot with a single main module holding `bytes`
pub fn module_snapshot(bytes: &[u8]) -> MemorySnapshot {
    MemorySnapshot::new()
        .with_pid(4242)
        .with_module("target.exe", MODULE_BASE, bytes)
}

/// Module image of `len` filler bytes with `needle` copied in at `offset`
pub fn image_with(len: usize, offset: usize, needle: &[u8]) -> Vec<u8> {
    let mut image = vec![0xCCu8; len];
    image[offset..offset + needle.len()].copy_from_slice(needle);
    image
}

/// Backend that injects failures into an otherwise working snapshot
pub struct FaultyProcess {
    pub inner: MemorySnapshot,
    pub short_write: Cell<bool>,
    pub fail_protect: Cell<bool>,
    pub protect_calls: Cell<usize>,
}

impl FaultyProcess {
    pub fn new(inner: MemorySnapshot) -> Self {
        FaultyProcess {
            inner,
            short_write: Cell::new(false),
            fail_protect: Cell::new(false),
            protect_calls: Cell::new(0),
        }
    }
}

impl ProcessMemory for FaultyProcess {
    fn read(&self, address: Address, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        self.inner.read(address, buffer)
    }

    fn write(&self, address: Address, data: &[u8]) -> Result<usize, ErrorCode> {
        if self.short_write.get() && data.len() > 1 {
            return self.inner.write(address, &data[..data.len() - 1]);
        }
        self.inner.write(address, data)
    }

    fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Result<Address, ErrorCode> {
        self.inner.allocate(size, allocation, protection)
    }

    fn free(&self, address: Address, size: usize, free_type: FreeType) -> Result<(), ErrorCode> {
        self.inner.free(address, size, free_type)
    }

    fn protect(
        &self,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> Result<ProtectionFlags, ErrorCode> {
        self.protect_calls.set(self.protect_calls.get() + 1);
        if self.fail_protect.get() {
            return Err(ErrorCode::AccessDenied);
        }
        self.inner.protect(address, size, protection)
    }

    fn query_residency(&self, pages: &[Address]) -> Result<Vec<bool>, ErrorCode> {
        self.inner.query_residency(pages)
    }

    fn main_module(&self) -> Option<ModuleInfo> {
        self.inner.main_module()
    }

    fn page_size(&self) -> usize {
        self.inner.page_size()
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    fn pid(&self) -> ProcessId {
        self.inner.pid()
    }
}
