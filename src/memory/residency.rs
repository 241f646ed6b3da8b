//! Physical residency checks before reads

use super::{MemoryAccessor, ProcessMemory};
use crate::core::types::{Address, MemoryError, MemoryOperation, MemoryResult};
use tracing::trace;

impl<B: ProcessMemory> MemoryAccessor<B> {
    /// Fails with [`MemoryError::PageNotResident`] if any page overlapping
    /// `[address, address + count)` is not backed by physical memory
    pub fn ensure_resident(&self, address: Address, count: usize) -> MemoryResult<()> {
        let pages = pages_covering(address, count, self.backend.page_size())?;
        let resident = self.backend.query_residency(&pages).map_err(|code| {
            MemoryError::access_failure(MemoryOperation::QueryResidency, address, count, code)
        })?;

        trace!("Residency of {} pages at {}: {:?}", pages.len(), address, resident);

        for (index, page) in pages.iter().enumerate() {
            if !resident.get(index).copied().unwrap_or(false) {
                return Err(MemoryError::PageNotResident(*page));
            }
        }
        Ok(())
    }
}

/// Page addresses from the page containing `address` through the page
/// containing the last byte of the range.
///
/// Fails if the range wraps past the end of the address space.
pub(crate) fn pages_covering(
    address: Address,
    count: usize,
    page_size: usize,
) -> MemoryResult<Vec<Address>> {
    let last_byte = address
        .as_usize()
        .checked_add(count.max(1) - 1)
        .ok_or_else(|| {
            MemoryError::invalid_argument("count", "range wraps past the end of the address space")
        })?;

    let first = address.align_down(page_size).as_usize();
    let last = Address::new(last_byte).align_down(page_size).as_usize();
    Ok((first..=last).step_by(page_size).map(Address::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemorySnapshot, ProtectionFlags};

    #[test]
    fn test_pages_covering_unaligned_range() {
        let pages = pages_covering(Address::new(0x1FF0), 0x20, 0x1000).unwrap();
        assert_eq!(pages, vec![Address::new(0x1000), Address::new(0x2000)]);
    }

    #[test]
    fn test_pages_covering_exact_page() {
        let pages = pages_covering(Address::new(0x3000), 0x1000, 0x1000).unwrap();
        assert_eq!(pages, vec![Address::new(0x3000)]);
    }

    #[test]
    fn test_pages_covering_top_of_address_space() {
        let pages = pages_covering(Address::new(usize::MAX - 0xFFF), 0x1000, 0x1000).unwrap();
        assert_eq!(pages, vec![Address::new(usize::MAX - 0xFFF)]);

        let pages = pages_covering(Address::new(usize::MAX - 0x10), 0x11, 0x1000).unwrap();
        assert_eq!(pages, vec![Address::new(usize::MAX - 0xFFF)]);
    }

    #[test]
    fn test_pages_covering_rejects_wrapping_range() {
        let result = pages_covering(Address::new(usize::MAX - 0xFFF), 0x1001, 0x1000);
        assert!(matches!(
            result,
            Err(MemoryError::InvalidArgument { argument: "count", .. })
        ));
    }

    #[test]
    fn test_top_of_address_space_is_checked_before_reading() {
        let mut accessor = MemoryAccessor::new(MemorySnapshot::new()).unwrap();
        accessor.set_verify_residency(true);

        let top_page = Address::new(usize::MAX - 0xFFF);
        assert!(matches!(
            accessor.read_bytes(top_page, 0x1000),
            Err(MemoryError::PageNotResident(page)) if page == top_page
        ));
        assert!(matches!(
            accessor.read_bytes(top_page, 0x1001),
            Err(MemoryError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_large_pages() {
        let snapshot = MemorySnapshot::new().with_page_size(0x4000);
        snapshot.map(Address::new(0x40000), &[1u8; 0x8000], ProtectionFlags::read_only());
        snapshot.set_resident(Address::new(0x44000), false);

        let accessor = MemoryAccessor::new(snapshot).unwrap();
        assert_eq!(accessor.backend().page_size(), 0x4000);
        assert!(accessor.ensure_resident(Address::new(0x40000), 0x4000).is_ok());
        assert!(matches!(
            accessor.ensure_resident(Address::new(0x43FFF), 2),
            Err(MemoryError::PageNotResident(page)) if page == Address::new(0x44000)
        ));
    }

    #[test]
    fn test_tail_page_is_checked() {
        let snapshot = MemorySnapshot::new();
        snapshot.map(Address::new(0x10000), &[1u8; 0x2000], ProtectionFlags::read_only());
        snapshot.set_resident(Address::new(0x11000), false);

        let accessor = MemoryAccessor::new(snapshot).unwrap();
        assert!(accessor.ensure_resident(Address::new(0x10000), 0x1000).is_ok());
        assert!(matches!(
            accessor.ensure_resident(Address::new(0x10FFE), 4),
            Err(MemoryError::PageNotResident(page)) if page == Address::new(0x11000)
        ));
    }
}
