//! Reads from target memory

use super::{MemoryAccessor, ProcessMemory};
use crate::core::types::{Address, ErrorCode, MemoryError, MemoryOperation, MemoryResult};
use crate::marshal::{self, Marshal};
use encoding_rs::Encoding;
use tracing::debug;

impl<B: ProcessMemory> MemoryAccessor<B> {
    /// Reads exactly `count` bytes.
    ///
    /// A zero count returns an empty buffer without touching the target.
    pub fn read_bytes(&self, address: Address, count: usize) -> MemoryResult<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if address.is_null() {
            return Err(MemoryError::invalid_argument(
                "address",
                "cannot be zero",
            ));
        }
        if self.verify_residency {
            self.ensure_resident(address, count)?;
        }

        let mut buffer = vec![0u8; count];
        let read = self.backend.read(address, &mut buffer).map_err(|code| {
            MemoryError::access_failure(MemoryOperation::Read, address, count, code)
        })?;

        if read != count {
            return Err(MemoryError::access_failure(
                MemoryOperation::Read,
                address,
                count,
                ErrorCode::PartialCopy,
            ));
        }

        Ok(buffer)
    }

    /// Reads a typed value.
    ///
    /// Bytes that do not decode to a valid `T` yield `T::zeroed()`; transfer
    /// failures are returned as errors.
    pub fn read_value<T: Marshal>(&self, address: Address) -> MemoryResult<T> {
        let layout = marshal::layout_of::<T>();
        let bytes = self.read_bytes(address, layout.size)?;

        Ok(marshal::decode(&bytes).unwrap_or_else(|| {
            debug!(
                "Bytes at {} are not a valid {}, using zero value",
                address,
                std::any::type_name::<T>()
            );
            T::zeroed()
        }))
    }

    /// Reads a zero-terminated UTF-8 string of at most `max_size` bytes
    pub fn read_string(&self, address: Address, max_size: usize) -> MemoryResult<String> {
        self.read_string_with(address, max_size, encoding_rs::UTF_8)
    }

    /// Reads a zero-terminated string of at most `max_size` bytes in `encoding`.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    pub fn read_string_with(
        &self,
        address: Address,
        max_size: usize,
        encoding: &'static Encoding,
    ) -> MemoryResult<String> {
        let bytes = self.read_bytes(address, max_size)?;
        let end = bytes
            .iter()
            .position(|b| *b == 0)
            .ok_or(MemoryError::BufferTooSmall { address, max_size })?;

        let (text, _) = encoding.decode_without_bom_handling(&bytes[..end]);
        Ok(text.into_owned())
    }
}
