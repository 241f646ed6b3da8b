//! Kernel32.dll bindings for process and memory operations

use crate::core::types::ErrorCode;
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, LPVOID};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{
    ReadProcessMemory, VirtualAllocEx, VirtualFreeEx, VirtualProtectEx, WriteProcessMemory,
};
use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
use winapi::um::winnt::HANDLE;

/// Exit code reported for a process that has not terminated
pub const STILL_ACTIVE: DWORD = 259;

/// The calling thread's last error
pub fn last_error() -> ErrorCode {
    unsafe { ErrorCode::from(GetLastError()) }
}

/// Safe wrapper for OpenProcess
pub fn open_process(pid: u32, desired_access: u32) -> Result<HANDLE, ErrorCode> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        Err(last_error())
    } else {
        Ok(handle)
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle that is not closed elsewhere
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), ErrorCode> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(last_error())
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_READ`
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: usize,
    buffer: &mut [u8],
) -> Result<usize, ErrorCode> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address as LPVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(bytes_read)
    }
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_WRITE`
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: usize,
    data: &[u8],
) -> Result<usize, ErrorCode> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address as LPVOID,
        data.as_ptr() as LPVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(bytes_written)
    }
}

/// Safe wrapper for VirtualAllocEx with the OS choosing the address
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_OPERATION`
pub unsafe fn virtual_alloc_ex(
    handle: HANDLE,
    size: usize,
    allocation_type: u32,
    protection: u32,
) -> Result<usize, ErrorCode> {
    let address = VirtualAllocEx(
        handle,
        std::ptr::null_mut(),
        size,
        allocation_type,
        protection,
    );

    if address.is_null() {
        Err(last_error())
    } else {
        Ok(address as usize)
    }
}

/// Safe wrapper for VirtualFreeEx
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_OPERATION`
pub unsafe fn virtual_free_ex(
    handle: HANDLE,
    address: usize,
    size: usize,
    free_type: u32,
) -> Result<(), ErrorCode> {
    if VirtualFreeEx(handle, address as LPVOID, size, free_type) == FALSE {
        Err(last_error())
    } else {
        Ok(())
    }
}

/// Safe wrapper for VirtualProtectEx, returning the previous protection
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_OPERATION`
pub unsafe fn virtual_protect_ex(
    handle: HANDLE,
    address: usize,
    size: usize,
    protection: u32,
) -> Result<u32, ErrorCode> {
    let mut old_protection: DWORD = 0;

    let result = VirtualProtectEx(
        handle,
        address as LPVOID,
        size,
        protection,
        &mut old_protection,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(old_protection)
    }
}

/// Safe wrapper for GetExitCodeProcess
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_QUERY_INFORMATION`
pub unsafe fn get_exit_code_process(handle: HANDLE) -> Result<u32, ErrorCode> {
    let mut exit_code: DWORD = 0;
    if GetExitCodeProcess(handle, &mut exit_code) == FALSE {
        Err(last_error())
    } else {
        Ok(exit_code)
    }
}

/// Page size of the running system
pub fn system_page_size() -> usize {
    unsafe {
        let mut info: SYSTEM_INFO = mem::zeroed();
        GetSystemInfo(&mut info);
        info.dwPageSize as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_null_handle_operations() {
        unsafe {
            assert!(close_handle(ptr::null_mut()).is_ok());

            let mut buffer = vec![0u8; 4];
            assert!(read_process_memory(ptr::null_mut(), 0x1000, &mut buffer).is_err());

            let data = vec![0u8; 4];
            assert!(write_process_memory(ptr::null_mut(), 0x1000, &data).is_err());

            assert!(virtual_alloc_ex(ptr::null_mut(), 0x1000, 0x1000, 0x04).is_err());
            assert!(get_exit_code_process(ptr::null_mut()).is_err());
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_process() {
        assert_eq!(open_process(0, 0x0400), Err(ErrorCode::InvalidParameter));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_page_size() {
        let page_size = system_page_size();
        assert!(page_size.is_power_of_two());
        assert!(page_size >= 4096);
    }
}
