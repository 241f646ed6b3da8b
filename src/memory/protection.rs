//! Page protection, allocation and free flags plus the protection guard

use super::ProcessMemory;
use crate::core::types::{Address, MemoryError, MemoryOperation, MemoryResult};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Memory protection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectionFlags {
    value: u32,
}

impl ProtectionFlags {
    // Protection constants
    pub const PAGE_NOACCESS: u32 = 0x01;
    pub const PAGE_READONLY: u32 = 0x02;
    pub const PAGE_READWRITE: u32 = 0x04;
    pub const PAGE_WRITECOPY: u32 = 0x08;
    pub const PAGE_EXECUTE: u32 = 0x10;
    pub const PAGE_EXECUTE_READ: u32 = 0x20;
    pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
    pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
    pub const PAGE_GUARD: u32 = 0x100;
    pub const PAGE_NOCACHE: u32 = 0x200;
    pub const PAGE_WRITECOMBINE: u32 = 0x400;

    pub const fn new(value: u32) -> Self {
        ProtectionFlags { value }
    }

    pub const fn no_access() -> Self {
        ProtectionFlags::new(Self::PAGE_NOACCESS)
    }

    pub const fn read_only() -> Self {
        ProtectionFlags::new(Self::PAGE_READONLY)
    }

    pub const fn read_write() -> Self {
        ProtectionFlags::new(Self::PAGE_READWRITE)
    }

    pub const fn execute_read() -> Self {
        ProtectionFlags::new(Self::PAGE_EXECUTE_READ)
    }

    pub const fn execute_read_write() -> Self {
        ProtectionFlags::new(Self::PAGE_EXECUTE_READWRITE)
    }

    /// Check if protection allows reading
    pub fn is_readable(&self) -> bool {
        let base = self.value & 0xFF;
        base != Self::PAGE_NOACCESS && base != Self::PAGE_EXECUTE && !self.is_guard()
    }

    /// Check if protection allows writing
    pub fn is_writable(&self) -> bool {
        (self.value
            & (Self::PAGE_READWRITE
                | Self::PAGE_WRITECOPY
                | Self::PAGE_EXECUTE_READWRITE
                | Self::PAGE_EXECUTE_WRITECOPY))
            != 0
    }

    /// Check if protection allows execution
    pub fn is_executable(&self) -> bool {
        (self.value
            & (Self::PAGE_EXECUTE
                | Self::PAGE_EXECUTE_READ
                | Self::PAGE_EXECUTE_READWRITE
                | Self::PAGE_EXECUTE_WRITECOPY))
            != 0
    }

    pub fn is_guard(&self) -> bool {
        (self.value & Self::PAGE_GUARD) != 0
    }

    pub fn with_guard(mut self) -> Self {
        self.value |= Self::PAGE_GUARD;
        self
    }

    /// Get the raw protection value
    pub fn raw(&self) -> u32 {
        self.value
    }
}

impl std::fmt::Display for ProtectionFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let base = match self.value & 0xFF {
            Self::PAGE_NOACCESS => "NOACCESS",
            Self::PAGE_READONLY => "R",
            Self::PAGE_READWRITE => "RW",
            Self::PAGE_WRITECOPY => "WC",
            Self::PAGE_EXECUTE => "X",
            Self::PAGE_EXECUTE_READ => "RX",
            Self::PAGE_EXECUTE_READWRITE => "RWX",
            Self::PAGE_EXECUTE_WRITECOPY => "WCX",
            _ => "UNKNOWN",
        };
        write!(f, "{}", base)?;
        if self.is_guard() {
            write!(f, "+G")?;
        }
        if (self.value & Self::PAGE_NOCACHE) != 0 {
            write!(f, "+NC")?;
        }
        Ok(())
    }
}

/// Allocation type flags for [`MemoryAccessor::allocate`](super::MemoryAccessor::allocate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationType {
    value: u32,
}

impl AllocationType {
    pub const MEM_COMMIT: u32 = 0x1000;
    pub const MEM_RESERVE: u32 = 0x2000;
    pub const MEM_RESET: u32 = 0x80000;
    pub const MEM_TOP_DOWN: u32 = 0x100000;
    pub const MEM_PHYSICAL: u32 = 0x400000;
    pub const MEM_LARGE_PAGES: u32 = 0x20000000;

    pub const fn new(value: u32) -> Self {
        AllocationType { value }
    }

    pub const fn commit() -> Self {
        AllocationType::new(Self::MEM_COMMIT)
    }

    pub const fn reserve() -> Self {
        AllocationType::new(Self::MEM_RESERVE)
    }

    pub const fn commit_reserve() -> Self {
        AllocationType::new(Self::MEM_COMMIT | Self::MEM_RESERVE)
    }

    pub fn contains(&self, flag: u32) -> bool {
        (self.value & flag) == flag
    }

    pub fn raw(&self) -> u32 {
        self.value
    }
}

impl Default for AllocationType {
    fn default() -> Self {
        AllocationType::commit()
    }
}

/// How a region is freed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeType {
    /// Decommit pages, keeping the reservation
    Decommit,
    /// Release the whole region; the size must be 0
    Release,
}

impl FreeType {
    pub fn raw(&self) -> u32 {
        match self {
            FreeType::Decommit => 0x4000,
            FreeType::Release => 0x8000,
        }
    }
}

/// Changes page protection for its lifetime and restores the previous
/// protection when dropped.
pub struct ProtectionGuard<'a, B: ProcessMemory + ?Sized> {
    backend: &'a B,
    address: Address,
    size: usize,
    old_protection: ProtectionFlags,
}

impl<'a, B: ProcessMemory + ?Sized> ProtectionGuard<'a, B> {
    /// Applies `protection` to `[address, address + size)`
    pub fn acquire(
        backend: &'a B,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> MemoryResult<Self> {
        let old_protection = backend.protect(address, size, protection).map_err(|code| {
            MemoryError::access_failure(MemoryOperation::Protect, address, size, code)
        })?;

        trace!(
            "Protection at {} ({} bytes) changed {} -> {}",
            address,
            size,
            old_protection,
            protection
        );

        Ok(ProtectionGuard {
            backend,
            address,
            size,
            old_protection,
        })
    }

    /// Protection that will be restored on drop
    pub fn old_protection(&self) -> ProtectionFlags {
        self.old_protection
    }
}

impl<B: ProcessMemory + ?Sized> Drop for ProtectionGuard<'_, B> {
    fn drop(&mut self) {
        if let Err(code) = self
            .backend
            .protect(self.address, self.size, self.old_protection)
        {
            warn!(
                "Failed to restore protection {} at {}: {}",
                self.old_protection, self.address, code
            );
        }
    }
}
