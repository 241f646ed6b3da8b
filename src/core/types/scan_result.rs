//! Signature scan results

use super::{Address, ModuleInfo};
use serde::{Deserialize, Serialize};

/// A resolved signature match.
///
/// Both addresses are relative to the scanned module's base. They are signed
/// because a modifier chain may resolve to an address below the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanResult {
    /// Module-relative address after the modifier chain ran
    pub address: isize,
    /// Module-relative address of the raw pattern match
    pub unmodified_address: isize,
}

impl ScanResult {
    /// Creates a scan result from already-relative addresses
    pub fn new(address: isize, unmodified_address: isize) -> Self {
        ScanResult {
            address,
            unmodified_address,
        }
    }

    /// Creates a scan result from absolute addresses inside `module`
    pub fn relative_to(module: &ModuleInfo, address: Address, unmodified: Address) -> Self {
        ScanResult {
            address: address.relative_to(module.base_address),
            unmodified_address: unmodified.relative_to(module.base_address),
        }
    }

    /// Absolute resolved address inside `module`
    pub fn absolute(&self, module: &ModuleInfo) -> Address {
        module.base_address.offset(self.address)
    }
}
