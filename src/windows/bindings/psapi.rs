//! PSAPI.dll bindings for module enumeration and working set queries

use super::kernel32::last_error;
use crate::core::types::ErrorCode;
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, MAX_PATH};
use winapi::um::psapi::{
    EnumProcessModules, GetModuleBaseNameW, GetModuleFileNameExW, GetModuleInformation,
    QueryWorkingSetEx, MODULEINFO,
};
use winapi::um::winnt::HANDLE;

/// One entry of a QueryWorkingSetEx request
#[repr(C)]
struct WorkingSetExInformation {
    virtual_address: usize,
    virtual_attributes: usize,
}

/// Safe wrapper for EnumProcessModules. The main executable comes first.
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn enum_process_modules(handle: HANDLE) -> Result<Vec<HMODULE>, ErrorCode> {
    let mut modules: Vec<HMODULE> = vec![std::ptr::null_mut(); 256];

    loop {
        let capacity = (modules.len() * mem::size_of::<HMODULE>()) as DWORD;
        let mut bytes_needed: DWORD = 0;

        let result = EnumProcessModules(handle, modules.as_mut_ptr(), capacity, &mut bytes_needed);
        if result == FALSE {
            return Err(last_error());
        }

        let count = bytes_needed as usize / mem::size_of::<HMODULE>();
        if bytes_needed <= capacity {
            modules.truncate(count);
            return Ok(modules);
        }
        modules.resize(count, std::ptr::null_mut());
    }
}

/// Safe wrapper for GetModuleInformation, returning base and image size
///
/// # Safety
/// The handle must be a valid process handle and module must be loaded in it
pub unsafe fn get_module_information(
    handle: HANDLE,
    module: HMODULE,
) -> Result<(usize, usize), ErrorCode> {
    let mut info: MODULEINFO = mem::zeroed();

    let result = GetModuleInformation(
        handle,
        module,
        &mut info,
        mem::size_of::<MODULEINFO>() as DWORD,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok((info.lpBaseOfDll as usize, info.SizeOfImage as usize))
    }
}

/// Safe wrapper for GetModuleBaseNameW
///
/// # Safety
/// The handle must be a valid process handle and module must be loaded in it
pub unsafe fn get_module_base_name(handle: HANDLE, module: HMODULE) -> Result<String, ErrorCode> {
    let mut buffer = [0u16; MAX_PATH];
    let length = GetModuleBaseNameW(handle, module, buffer.as_mut_ptr(), MAX_PATH as DWORD);

    if length == 0 {
        Err(last_error())
    } else {
        Ok(String::from_utf16_lossy(&buffer[..length as usize]))
    }
}

/// Safe wrapper for GetModuleFileNameExW
///
/// # Safety
/// The handle must be a valid process handle and module must be loaded in it
pub unsafe fn get_module_file_name(handle: HANDLE, module: HMODULE) -> Result<String, ErrorCode> {
    let mut buffer = [0u16; MAX_PATH];
    let length = GetModuleFileNameExW(handle, module, buffer.as_mut_ptr(), MAX_PATH as DWORD);

    if length == 0 {
        Err(last_error())
    } else {
        Ok(String::from_utf16_lossy(&buffer[..length as usize]))
    }
}

/// Safe wrapper for QueryWorkingSetEx. Reports the valid bit of each page.
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_QUERY_INFORMATION`
pub unsafe fn query_working_set_ex(handle: HANDLE, pages: &[usize]) -> Result<Vec<bool>, ErrorCode> {
    let mut entries: Vec<WorkingSetExInformation> = pages
        .iter()
        .map(|&page| WorkingSetExInformation {
            virtual_address: page,
            virtual_attributes: 0,
        })
        .collect();

    let result = QueryWorkingSetEx(
        handle,
        entries.as_mut_ptr().cast(),
        (entries.len() * mem::size_of::<WorkingSetExInformation>()) as DWORD,
    );

    if result == FALSE {
        return Err(last_error());
    }

    Ok(entries
        .iter()
        .map(|entry| entry.virtual_attributes & 1 != 0)
        .collect())
}
