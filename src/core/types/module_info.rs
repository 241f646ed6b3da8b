//! Loaded module description

use super::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A module mapped into the target process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub path: PathBuf,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    /// Creates a new ModuleInfo
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleInfo {
            name: name.into(),
            path: PathBuf::new(),
            base_address,
            size,
        }
    }

    /// Sets the on-disk path of the module
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Gets the end address of the module
    pub fn end_address(&self) -> Address {
        self.base_address.add_bytes(self.size)
    }

    /// Checks if an address is within this module
    pub fn contains_address(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_bounds() {
        let module = ModuleInfo::new("game.exe", Address::new(0x40_0000), 0x1000);
        assert_eq!(module.end_address(), Address::new(0x40_1000));
        assert!(module.contains_address(Address::new(0x40_0000)));
        assert!(module.contains_address(Address::new(0x40_0FFF)));
        assert!(!module.contains_address(Address::new(0x40_1000)));
        assert!(!module.contains_address(Address::new(0x3F_FFFF)));
    }

    #[test]
    fn test_module_serialization() {
        let module = ModuleInfo::new("game.exe", Address::new(0x1000), 0x200)
            .with_path("C:\\Games\\game.exe");
        let json = serde_json::to_string(&module).unwrap();
        let back: ModuleInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, module);
    }
}
