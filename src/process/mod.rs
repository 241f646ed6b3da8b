//! Live process backend for Windows
//!
//! Opens a target process and implements [`ProcessMemory`](crate::memory::ProcessMemory)
//! over it.

mod backend;
mod handle;
mod modules;

pub use backend::WindowsProcess;
pub use handle::{ProcessAccess, ProcessHandle};
pub use modules::enumerate_modules;
