//! Writes to target memory

use super::{MemoryAccessor, ProcessMemory, ProtectionFlags, ProtectionGuard};
use crate::core::types::{Address, ErrorCode, MemoryError, MemoryOperation, MemoryResult};
use crate::marshal::{self, Marshal};
use tracing::trace;

impl<B: ProcessMemory> MemoryAccessor<B> {
    /// Writes `bytes`, making the pages writable for the duration of the call.
    ///
    /// The previous protection is restored before returning on every path.
    pub fn write_bytes(&self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let _guard = ProtectionGuard::acquire(
            &self.backend,
            address,
            bytes.len(),
            ProtectionFlags::read_write(),
        )?;

        trace!("Writing {} bytes at {}: {}", bytes.len(), address, hex::encode(bytes));

        let written = self.backend.write(address, bytes).map_err(|code| {
            MemoryError::access_failure(MemoryOperation::Write, address, bytes.len(), code)
        })?;

        if written != bytes.len() {
            return Err(MemoryError::access_failure(
                MemoryOperation::Write,
                address,
                bytes.len(),
                ErrorCode::PartialCopy,
            ));
        }

        Ok(())
    }

    /// Serializes `value` in target layout and writes it
    pub fn write_value<T: Marshal>(&self, address: Address, value: &T) -> MemoryResult<()> {
        let bytes = marshal::encode(value);
        self.write_bytes(address, &bytes)
    }
}
