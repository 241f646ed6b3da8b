//! Owned HANDLE with automatic cleanup

use crate::windows::bindings::kernel32;
use tracing::warn;
use winapi::um::winnt::HANDLE;

/// A Windows HANDLE closed exactly once, on drop
pub struct Handle {
    handle: HANDLE,
}

impl Handle {
    /// Takes ownership of `handle`. Null handles are rejected.
    pub fn from_raw(handle: HANDLE) -> Option<Self> {
        if handle.is_null() {
            None
        } else {
            Some(Handle { handle })
        }
    }

    /// The raw handle, valid while `self` lives
    pub fn raw(&self) -> HANDLE {
        self.handle
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(code) = unsafe { kernel32::close_handle(self.handle) } {
            warn!("Failed to close handle {:p}: {}", self.handle, code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_null_is_rejected() {
        assert!(Handle::from_raw(ptr::null_mut()).is_none());
    }
}
