//! Locked, access-protected memory for short-lived secrets.
//!
//! A [`SecureBuffer`] keeps a secret in whole pages of memory which are
//! pinned in RAM, inaccessible except while being read or written, and zeroed
//! before they are returned to the operating system.

#![warn(missing_docs)]

#[cfg(all(not(unix), not(windows), not(miri)))]
compile_error!("Only Unix and Windows platforms are currently supported");

pub mod alloc;
pub mod buffer;
pub mod error;
pub mod lock;
pub mod platform;
pub mod protect;
pub mod zero;

pub(crate) mod guard;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use self::{
    buffer::SecureBuffer,
    error::{error_string, Error, MemoryError, Result},
    platform::{PagePlatform, SystemPages},
    protect::ProtectionMode,
};

/// The library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetch the library version.
pub const fn version() -> &'static str {
    VERSION
}
