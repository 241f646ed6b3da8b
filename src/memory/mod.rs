//! Memory access for a target process
//!
//! This module provides:
//! - [`ProcessMemory`], the raw OS calls an accessor runs on
//! - [`MemoryAccessor`], safe read/write/allocate/free primitives
//! - [`MemorySnapshot`], an in-memory backend
//! - [`scanner`], signature scanning over a module

mod allocation;
mod backend;
mod protection;
mod reader;
mod residency;
pub mod scanner;
mod snapshot;
mod writer;

pub use allocation::Allocation;
pub use backend::ProcessMemory;
pub use protection::{AllocationType, FreeType, ProtectionFlags, ProtectionGuard};
pub use snapshot::MemorySnapshot;

use crate::core::types::{Address, MemoryError, MemoryOperation, MemoryResult, ModuleInfo, ProcessId};
use tracing::{debug, warn};

/// Safe memory primitives over one target process.
///
/// The accessor owns its backend, and with it the process handle, for its
/// whole lifetime. It is meant for use from a single thread.
pub struct MemoryAccessor<B: ProcessMemory> {
    backend: B,
    image_base: Address,
    verify_residency: bool,
}

impl<B: ProcessMemory> MemoryAccessor<B> {
    /// Wraps a backend, failing if the target has already exited
    pub fn new(backend: B) -> MemoryResult<Self> {
        if !backend.is_alive() {
            return Err(MemoryError::ProcessExited(backend.pid()));
        }

        let image_base = backend
            .main_module()
            .map(|module| module.base_address)
            .unwrap_or_default();

        debug!("Attached to process {} (image base {})", backend.pid(), image_base);

        Ok(MemoryAccessor {
            backend,
            image_base,
            verify_residency: false,
        })
    }

    /// Check that every page is physically backed before each read
    pub fn set_verify_residency(&mut self, verify: bool) {
        self.verify_residency = verify;
    }

    pub fn verify_residency(&self) -> bool {
        self.verify_residency
    }

    /// Base address of the main module, null if there is none
    pub fn image_base(&self) -> Address {
        self.image_base
    }

    pub fn main_module(&self) -> Option<ModuleInfo> {
        self.backend.main_module()
    }

    pub fn pid(&self) -> ProcessId {
        self.backend.pid()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Allocates memory inside the target.
    ///
    /// Returns a null address on failure.
    pub fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Address {
        match self.backend.allocate(size, allocation, protection) {
            Ok(address) => {
                debug!("Allocated {} bytes at {} ({})", size, address, protection);
                address
            }
            Err(code) => {
                let error = MemoryError::access_failure(
                    MemoryOperation::Allocate,
                    Address::null(),
                    size,
                    code,
                );
                warn!("{}", error);
                Address::null()
            }
        }
    }

    /// Allocates memory that is released when the returned guard drops
    pub fn allocate_scoped(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Allocation<'_, B> {
        Allocation::new(self, self.allocate(size, allocation, protection), size)
    }

    /// Frees memory inside the target. The size is ignored for [`FreeType::Release`].
    pub fn free(&self, address: Address, size: usize, free_type: FreeType) -> MemoryResult<()> {
        let size = match free_type {
            FreeType::Release => 0,
            FreeType::Decommit => size,
        };

        self.backend
            .free(address, size, free_type)
            .map_err(|code| MemoryError::access_failure(MemoryOperation::Free, address, size, code))?;

        debug!("Freed {} ({:?})", address, free_type);
        Ok(())
    }

    /// Releases a whole region
    pub fn release(&self, address: Address) -> MemoryResult<()> {
        self.free(address, 0, FreeType::Release)
    }
}
