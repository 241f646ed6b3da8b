//! Windows API layer for the process backend
//!
//! All unsafe FFI calls are contained within this module. Failures are
//! reported as the thread's last [`ErrorCode`].

pub mod bindings;
pub mod types;

pub use bindings::last_error;
pub use types::Handle;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ErrorCode;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_last_error_after_failed_open() {
        assert!(bindings::open_process(0, 0x0400).is_err());
        assert_ne!(last_error(), ErrorCode::Success);
    }
}
