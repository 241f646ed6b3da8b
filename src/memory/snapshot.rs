//! In-memory process image
//!
//! [`MemorySnapshot`] implements [`ProcessMemory`] over regions held in this
//! process. It backs offline analysis of dumped modules and the test suite.

use super::{AllocationType, FreeType, ProcessMemory, ProtectionFlags};
use crate::core::types::{Address, ErrorCode, ModuleInfo, ProcessId};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

const DEFAULT_PAGE_SIZE: usize = 0x1000;
const ALLOCATION_BASE: usize = 0x2000_0000;

#[derive(Debug, Clone, Copy)]
struct PageState {
    protection: ProtectionFlags,
    committed: bool,
    resident: bool,
}

#[derive(Debug)]
struct Region {
    data: Vec<u8>,
    pages: Vec<PageState>,
    allocated: bool,
}

impl Region {
    fn page_range(&self, offset: usize, len: usize, page_size: usize) -> std::ops::Range<usize> {
        let first = offset / page_size;
        let last = (offset + len.max(1) - 1) / page_size;
        first..(last + 1).min(self.pages.len())
    }
}

/// A process address space held in memory.
///
/// Regions must not overlap. Interior mutability makes the snapshot usable
/// through `&self` like a live process, and keeps it `!Sync`.
#[derive(Debug)]
pub struct MemorySnapshot {
    pid: ProcessId,
    page_size: usize,
    regions: RefCell<BTreeMap<usize, Region>>,
    modules: RefCell<Vec<ModuleInfo>>,
    next_allocation: Cell<usize>,
    alive: Cell<bool>,
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySnapshot {
    pub fn new() -> Self {
        MemorySnapshot {
            pid: 0,
            page_size: DEFAULT_PAGE_SIZE,
            regions: RefCell::new(BTreeMap::new()),
            modules: RefCell::new(Vec::new()),
            next_allocation: Cell::new(ALLOCATION_BASE),
            alive: Cell::new(true),
        }
    }

    /// Page size must be a power of two
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pid(mut self, pid: ProcessId) -> Self {
        self.pid = pid;
        self
    }

    /// Maps `bytes` as an executable module. The first module added is the main module.
    pub fn with_module(self, name: &str, base: Address, bytes: &[u8]) -> Self {
        self.map(base, bytes, ProtectionFlags::execute_read());
        self.modules
            .borrow_mut()
            .push(ModuleInfo::new(name, base, bytes.len()));
        self
    }

    /// Maps committed, resident memory holding `bytes` at `base`
    pub fn map(&self, base: Address, bytes: &[u8], protection: ProtectionFlags) {
        let start = base.align_down(self.page_size);
        let padding = base.as_usize() - start.as_usize();
        let len = Address::new(padding + bytes.len().max(1))
            .align_up(self.page_size)
            .as_usize();

        let mut data = vec![0u8; len];
        data[padding..padding + bytes.len()].copy_from_slice(bytes);

        let page = PageState {
            protection,
            committed: true,
            resident: true,
        };
        self.regions.borrow_mut().insert(
            start.as_usize(),
            Region {
                data,
                pages: vec![page; len / self.page_size],
                allocated: false,
            },
        );
    }

    /// Marks the page containing `address` as paged in or out
    pub fn set_resident(&self, address: Address, resident: bool) {
        let page_size = self.page_size;
        let _ = self.walk(address, 1, |region, offset, span, _| {
            for index in region.page_range(offset, span, page_size) {
                region.pages[index].resident = resident;
            }
            Ok(())
        });
    }

    /// Current protection of the page containing `address`
    pub fn protection_at(&self, address: Address) -> Option<ProtectionFlags> {
        let mut protection = None;
        let page_size = self.page_size;
        self.walk(address, 1, |region, offset, _, _| {
            protection = Some(region.pages[offset / page_size].protection);
            Ok(())
        })
        .ok()?;
        protection
    }

    /// Reads bytes regardless of page protection
    pub fn peek(&self, address: Address, len: usize) -> Option<Vec<u8>> {
        let mut out = vec![0u8; len];
        self.walk(address, len, |region, offset, span, done| {
            out[done..done + span].copy_from_slice(&region.data[offset..offset + span]);
            Ok(())
        })
        .ok()?;
        Some(out)
    }

    /// Makes every later call behave as if the process had exited
    pub fn terminate(&self) {
        self.alive.set(false);
    }

    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.borrow().clone()
    }

    fn check_alive(&self) -> Result<(), ErrorCode> {
        if self.alive.get() {
            Ok(())
        } else {
            Err(ErrorCode::InvalidHandle)
        }
    }

    /// Visits each region span covering `[address, address + len)`
    fn walk<F>(&self, address: Address, len: usize, mut visit: F) -> Result<(), ErrorCode>
    where
        F: FnMut(&mut Region, usize, usize, usize) -> Result<(), ErrorCode>,
    {
        let mut regions = self.regions.borrow_mut();
        let mut done = 0;
        while done < len {
            let cursor = address
                .as_usize()
                .checked_add(done)
                .ok_or(ErrorCode::InvalidAddress)?;
            let (base, region) = regions
                .range_mut(..=cursor)
                .next_back()
                .ok_or(ErrorCode::InvalidAddress)?;
            let offset = cursor - *base;
            if offset >= region.data.len() {
                return Err(ErrorCode::InvalidAddress);
            }
            let span = (region.data.len() - offset).min(len - done);
            visit(region, offset, span, done)?;
            done += span;
        }
        Ok(())
    }
}

impl ProcessMemory for MemorySnapshot {
    fn read(&self, address: Address, buffer: &mut [u8]) -> Result<usize, ErrorCode> {
        self.check_alive()?;
        let page_size = self.page_size;
        self.walk(address, buffer.len(), |region, offset, span, done| {
            let readable = region.page_range(offset, span, page_size).all(|index| {
                let page = region.pages[index];
                page.committed && page.protection.is_readable()
            });
            if !readable {
                return Err(ErrorCode::PartialCopy);
            }
            buffer[done..done + span].copy_from_slice(&region.data[offset..offset + span]);
            Ok(())
        })
        .map_err(|_| ErrorCode::PartialCopy)?;
        Ok(buffer.len())
    }

    fn write(&self, address: Address, data: &[u8]) -> Result<usize, ErrorCode> {
        self.check_alive()?;
        let page_size = self.page_size;
        self.walk(address, data.len(), |region, offset, span, _| {
            let writable = region.page_range(offset, span, page_size).all(|index| {
                let page = region.pages[index];
                page.committed && page.protection.is_writable()
            });
            if writable {
                Ok(())
            } else {
                Err(ErrorCode::NoAccess)
            }
        })?;
        self.walk(address, data.len(), |region, offset, span, done| {
            region.data[offset..offset + span].copy_from_slice(&data[done..done + span]);
            Ok(())
        })?;
        Ok(data.len())
    }

    fn allocate(
        &self,
        size: usize,
        allocation: AllocationType,
        protection: ProtectionFlags,
    ) -> Result<Address, ErrorCode> {
        self.check_alive()?;
        if size == 0 {
            return Err(ErrorCode::InvalidParameter);
        }

        let base = Address::new(self.next_allocation.get()).align_up(self.page_size);
        let len = Address::new(size).align_up(self.page_size).as_usize();
        self.next_allocation
            .set(base.as_usize() + len + self.page_size);

        let committed = allocation.contains(AllocationType::MEM_COMMIT);
        let page = PageState {
            protection,
            committed,
            resident: committed,
        };
        self.regions.borrow_mut().insert(
            base.as_usize(),
            Region {
                data: vec![0u8; len],
                pages: vec![page; len / self.page_size],
                allocated: true,
            },
        );
        Ok(base)
    }

    fn free(&self, address: Address, size: usize, free_type: FreeType) -> Result<(), ErrorCode> {
        self.check_alive()?;
        match free_type {
            FreeType::Release => {
                if size != 0 {
                    return Err(ErrorCode::InvalidParameter);
                }
                let mut regions = self.regions.borrow_mut();
                match regions.get(&address.as_usize()) {
                    Some(region) if region.allocated => {
                        regions.remove(&address.as_usize());
                        Ok(())
                    }
                    _ => Err(ErrorCode::InvalidAddress),
                }
            }
            FreeType::Decommit => {
                let page_size = self.page_size;
                let len = if size == 0 { 1 } else { size };
                self.walk(address, len, |region, offset, span, _| {
                    if !region.allocated {
                        return Err(ErrorCode::InvalidAddress);
                    }
                    let range = if size == 0 {
                        0..region.pages.len()
                    } else {
                        region.page_range(offset, span, page_size)
                    };
                    for index in range {
                        region.pages[index].committed = false;
                        region.pages[index].resident = false;
                    }
                    Ok(())
                })
            }
        }
    }

    fn protect(
        &self,
        address: Address,
        size: usize,
        protection: ProtectionFlags,
    ) -> Result<ProtectionFlags, ErrorCode> {
        self.check_alive()?;
        let page_size = self.page_size;
        let len = size.max(1);

        let mut old = None;
        self.walk(address, len, |region, offset, span, _| {
            let range = region.page_range(offset, span, page_size);
            if range.clone().any(|index| !region.pages[index].committed) {
                return Err(ErrorCode::InvalidAddress);
            }
            if old.is_none() {
                old = Some(region.pages[range.start].protection);
            }
            Ok(())
        })?;

        self.walk(address, len, |region, offset, span, _| {
            for index in region.page_range(offset, span, page_size) {
                region.pages[index].protection = protection;
            }
            Ok(())
        })?;

        old.ok_or(ErrorCode::InvalidAddress)
    }

    fn query_residency(&self, pages: &[Address]) -> Result<Vec<bool>, ErrorCode> {
        self.check_alive()?;
        let page_size = self.page_size;
        Ok(pages
            .iter()
            .map(|page| {
                let mut resident = false;
                let _ = self.walk(*page, 1, |region, offset, _, _| {
                    let state = region.pages[offset / page_size];
                    resident = state.committed && state.resident;
                    Ok(())
                });
                resident
            })
            .collect())
    }

    fn main_module(&self) -> Option<ModuleInfo> {
        self.modules.borrow().first().cloned()
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }

    fn pid(&self) -> ProcessId {
        self.pid
    }
}
