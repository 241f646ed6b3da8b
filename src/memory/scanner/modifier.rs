//! Address modifiers applied to raw pattern matches

use crate::core::types::{Address, MemoryError, MemoryResult};
use crate::memory::{MemoryAccessor, ProcessMemory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the bytes at an address encode the address of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaKind {
    /// The u8 at the address is the result
    Byte,
    /// The u16 at the address is the result
    Word,
    /// The u32 at the address is the result
    Dword,
    /// Call displacement: address + 4 + i32
    E8,
    /// The address itself
    SimpleAddress,
    /// address + 5 + i32
    Cmp,
    /// address + 4 + i32
    CmpMinusOne,
    /// address + 8 + i32
    RelativePlus8,
    /// Any kind this version does not know
    #[serde(other)]
    Unsupported,
}

/// One step of a modifier chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    AddOffset(u32),
    Lea(LeaKind),
}

impl Modifier {
    /// Transforms `address`, reading target memory where the kind requires it
    pub fn apply<B: ProcessMemory>(
        &self,
        accessor: &MemoryAccessor<B>,
        address: Address,
    ) -> MemoryResult<Address> {
        match *self {
            Modifier::AddOffset(offset) => Ok(address.add_bytes(offset as usize)),
            Modifier::Lea(kind) => match kind {
                LeaKind::Byte => Ok(Address::new(accessor.read_value::<u8>(address)? as usize)),
                LeaKind::Word => Ok(Address::new(accessor.read_value::<u16>(address)? as usize)),
                LeaKind::Dword => Ok(Address::new(accessor.read_value::<u32>(address)? as usize)),
                LeaKind::E8 | LeaKind::CmpMinusOne => relative(accessor, address, 4),
                LeaKind::SimpleAddress => Ok(address),
                LeaKind::Cmp => relative(accessor, address, 5),
                LeaKind::RelativePlus8 => relative(accessor, address, 8),
                LeaKind::Unsupported => Err(MemoryError::UnsupportedModifier(self.to_string())),
            },
        }
    }
}

fn relative<B: ProcessMemory>(
    accessor: &MemoryAccessor<B>,
    address: Address,
    instruction_tail: isize,
) -> MemoryResult<Address> {
    let displacement = accessor.read_value::<i32>(address)?;
    Ok(address.offset(instruction_tail + displacement as isize))
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::AddOffset(offset) => write!(f, "add_offset({})", offset),
            Modifier::Lea(kind) => write!(f, "lea({:?})", kind),
        }
    }
}
