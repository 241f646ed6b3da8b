//! Signature scanning over the main module of a target
//!
//! A [`MemoryPattern`] pairs a [`BytePattern`] with a chain of [`Modifier`]s.
//! [`MemoryPattern::find`] reads the module in overlapping chunks, compares
//! each candidate position against the mask and runs every raw match through
//! the chain, yielding module-relative [`ScanResult`]s lazily.

mod modifier;
mod pattern;
mod signature;

pub use modifier::{LeaKind, Modifier};
pub use pattern::{BytePattern, ParsedTemplate};
pub use signature::{SignatureDefinition, SignatureSet};

use crate::core::types::{Address, MemoryError, MemoryResult, ModuleInfo, ScanResult};
use crate::memory::{MemoryAccessor, ProcessMemory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Smallest chunk read from the target in one call
pub const MIN_CHUNK_SIZE: usize = 4096;

/// Options for a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Bytes read per chunk; raised to the pattern length if shorter
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            chunk_size: MIN_CHUNK_SIZE,
        }
    }
}

/// A named byte pattern and the modifier chain that resolves its matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPattern {
    name: String,
    pattern: BytePattern,
    modifiers: Vec<Modifier>,
}

impl MemoryPattern {
    /// Parses `template` and builds the modifier chain.
    ///
    /// If the template contains a `??` token, an [`Modifier::AddOffset`] with
    /// the index of the first such token is inserted before `modifiers`. Later
    /// `??` tokens add nothing.
    pub fn new(
        name: impl Into<String>,
        template: &str,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> MemoryResult<Self> {
        let parsed = BytePattern::parse_template(template)?;

        let mut chain: Vec<Modifier> = parsed
            .capture
            .map(|index| Modifier::AddOffset(index as u32))
            .into_iter()
            .collect();
        chain.extend(modifiers);

        Ok(MemoryPattern {
            name: name.into(),
            pattern: parsed.pattern,
            modifiers: chain,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &BytePattern {
        &self.pattern
    }

    /// The full chain, including any inserted offset
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Runs `address` through the modifier chain in order
    pub fn resolve<B: ProcessMemory>(
        &self,
        accessor: &MemoryAccessor<B>,
        address: Address,
    ) -> MemoryResult<Address> {
        self.modifiers
            .iter()
            .try_fold(address, |current, modifier| modifier.apply(accessor, current))
    }

    /// Scans the main module with default options
    pub fn find<'a, B: ProcessMemory>(
        &'a self,
        accessor: &'a MemoryAccessor<B>,
    ) -> MemoryResult<PatternScan<'a, B>> {
        self.find_with(accessor, &ScanOptions::default())
    }

    /// Scans the main module.
    ///
    /// Fails with [`MemoryError::ModuleNotFound`] if the target has no main
    /// module. Read and modifier errors are yielded by the iterator, which
    /// then ends.
    pub fn find_with<'a, B: ProcessMemory>(
        &'a self,
        accessor: &'a MemoryAccessor<B>,
        options: &ScanOptions,
    ) -> MemoryResult<PatternScan<'a, B>> {
        let module = accessor.main_module().ok_or_else(|| {
            MemoryError::ModuleNotFound(format!("main module of process {}", accessor.pid()))
        })?;
        Ok(PatternScan::new(self, accessor, module, options))
    }
}

/// Lazy scan over one module. Dropping it stops the scan.
pub struct PatternScan<'a, B: ProcessMemory> {
    pattern: &'a MemoryPattern,
    accessor: &'a MemoryAccessor<B>,
    module: ModuleInfo,
    chunk_size: usize,
    step: usize,
    next_offset: usize,
    exhausted: bool,
    chunk: Vec<u8>,
    chunk_offset: usize,
    candidate: usize,
    limit: usize,
    seen: HashSet<isize>,
    finished: bool,
}

impl<'a, B: ProcessMemory> PatternScan<'a, B> {
    fn new(
        pattern: &'a MemoryPattern,
        accessor: &'a MemoryAccessor<B>,
        module: ModuleInfo,
        options: &ScanOptions,
    ) -> Self {
        let len = pattern.pattern.len();
        let chunk_size = options.chunk_size.max(len);
        let step = (chunk_size - len).max(1);

        debug!(
            "Scanning {} at {} ({} bytes) for '{}' [{}]",
            module.name, module.base_address, module.size, pattern.name, pattern.pattern
        );

        PatternScan {
            pattern,
            accessor,
            module,
            chunk_size,
            step,
            next_offset: 0,
            exhausted: false,
            chunk: Vec::new(),
            chunk_offset: 0,
            candidate: 0,
            limit: 0,
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Module being scanned
    pub fn module(&self) -> &ModuleInfo {
        &self.module
    }

    /// Loads the next chunk; false once the module is fully covered
    fn load_chunk(&mut self) -> MemoryResult<bool> {
        let len = self.pattern.pattern.len();
        let offset = self.next_offset;
        if self.exhausted || offset + len > self.module.size {
            return Ok(false);
        }

        let chunk_len = self.chunk_size.min(self.module.size - offset);
        self.chunk = self
            .accessor
            .read_bytes(self.module.base_address.add_bytes(offset), chunk_len)?;

        let last = offset + chunk_len == self.module.size;
        self.chunk_offset = offset;
        self.candidate = 0;
        self.limit = if last { chunk_len - len + 1 } else { self.step };
        self.exhausted = last;
        self.next_offset = offset + self.step;

        trace!("Loaded chunk at +0x{:X} ({} bytes)", offset, chunk_len);
        Ok(true)
    }

    fn fail(&mut self, error: MemoryError) -> Option<MemoryResult<ScanResult>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<B: ProcessMemory> Iterator for PatternScan<'_, B> {
    type Item = MemoryResult<ScanResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let len = self.pattern.pattern.len();
        loop {
            while self.candidate < self.limit {
                let index = self.candidate;
                self.candidate += 1;

                if !self.pattern.pattern.matches(&self.chunk[index..index + len]) {
                    continue;
                }

                let raw = self
                    .module
                    .base_address
                    .add_bytes(self.chunk_offset + index);
                let resolved = match self.pattern.resolve(self.accessor, raw) {
                    Ok(address) => address,
                    Err(e) => return self.fail(e),
                };

                let result = ScanResult::relative_to(&self.module, resolved, raw);
                if self.seen.insert(result.address) {
                    return Some(Ok(result));
                }
            }

            match self.load_chunk() {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        "Scan for '{}' finished with {} results",
                        self.pattern.name,
                        self.seen.len()
                    );
                    self.finished = true;
                    return None;
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}
