//! Owned Windows resource types

pub mod handle;

pub use handle::Handle;
