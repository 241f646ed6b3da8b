//! Scoped allocations inside the target

use super::{MemoryAccessor, ProcessMemory};
use crate::core::types::Address;
use tracing::warn;

/// A region allocated in the target, released when dropped
pub struct Allocation<'a, B: ProcessMemory> {
    accessor: &'a MemoryAccessor<B>,
    address: Address,
    size: usize,
}

impl<'a, B: ProcessMemory> Allocation<'a, B> {
    pub(super) fn new(accessor: &'a MemoryAccessor<B>, address: Address, size: usize) -> Self {
        Allocation {
            accessor,
            address,
            size,
        }
    }

    /// Base of the region, null if the allocation failed
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_null(&self) -> bool {
        self.address.is_null()
    }

    /// Keeps the region alive past the guard
    pub fn leak(mut self) -> Address {
        std::mem::replace(&mut self.address, Address::null())
    }
}

impl<B: ProcessMemory> Drop for Allocation<'_, B> {
    fn drop(&mut self) {
        if self.address.is_null() {
            return;
        }
        if let Err(e) = self.accessor.release(self.address) {
            warn!("Failed to release allocation at {}: {}", self.address, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{AllocationType, MemorySnapshot, ProtectionFlags};

    #[test]
    fn test_leaked_allocation_survives() {
        let accessor = MemoryAccessor::new(MemorySnapshot::new()).unwrap();
        let allocation =
            accessor.allocate_scoped(16, AllocationType::commit(), ProtectionFlags::read_write());
        assert_eq!(allocation.size(), 16);
        let address = allocation.leak();
        assert!(accessor.backend().peek(address, 16).is_some());
        accessor.release(address).unwrap();
    }

    #[test]
    fn test_failed_allocation_drops_quietly() {
        let accessor = MemoryAccessor::new(MemorySnapshot::new()).unwrap();
        let allocation =
            accessor.allocate_scoped(0, AllocationType::commit(), ProtectionFlags::read_write());
        assert!(allocation.is_null());
    }
}
