//! Module enumeration for an open process

use super::ProcessHandle;
use crate::core::types::{Address, ErrorCode, ModuleInfo};
use crate::windows::bindings::psapi;
use tracing::trace;

/// Lists the modules loaded in the process, main executable first.
///
/// Modules whose information cannot be read are skipped.
pub fn enumerate_modules(handle: &ProcessHandle) -> Result<Vec<ModuleInfo>, ErrorCode> {
    let modules = unsafe { psapi::enum_process_modules(handle.raw())? };

    let mut infos = Vec::with_capacity(modules.len());
    for module in modules {
        let info = unsafe {
            let (base, size) = match psapi::get_module_information(handle.raw(), module) {
                Ok(info) => info,
                Err(code) => {
                    trace!("Skipping module {:p}: {}", module, code);
                    continue;
                }
            };
            let name = psapi::get_module_base_name(handle.raw(), module).unwrap_or_default();
            let mut info = ModuleInfo::new(name, Address::new(base), size);
            if let Ok(path) = psapi::get_module_file_name(handle.raw(), module) {
                info = info.with_path(path);
            }
            info
        };
        infos.push(info);
    }

    Ok(infos)
}
