//! The operating system services a secure buffer is built on.

use core::fmt;
use core::ptr::NonNull;

use crate::alloc::{alloc_pages, dealloc_pages, default_page_size};
use crate::error::MemoryError;
use crate::lock::{lock_pages, unlock_pages};
use crate::protect::{set_page_protection, ProtectionMode};
use crate::zero;

/// The capabilities required to manage a secure memory region.
///
/// All lengths passed to these methods are whole multiples of
/// [`page_size`](PagePlatform::page_size), and all addresses were returned
/// by [`allocate`](PagePlatform::allocate) on the same platform.
pub trait PagePlatform: fmt::Debug {
    /// The virtual memory page size.
    fn page_size(&self) -> usize;

    /// Obtain a page-aligned, writable region of `len` bytes.
    fn allocate(&self, len: usize) -> Result<NonNull<u8>, MemoryError>;

    /// Return a region to the operating system.
    ///
    /// # Safety
    /// The region must have been produced by `allocate` with the same
    /// length and must not be accessed afterwards.
    unsafe fn release(&self, addr: NonNull<u8>, len: usize);

    /// Pin the region in physical memory.
    fn lock(&self, addr: NonNull<u8>, len: usize) -> Result<(), MemoryError>;

    /// Undo a previous [`lock`](PagePlatform::lock).
    fn unlock(&self, addr: NonNull<u8>, len: usize) -> Result<(), MemoryError>;

    /// Change the access permissions for the region.
    fn protect(&self, addr: NonNull<u8>, len: usize, mode: ProtectionMode)
        -> Result<(), MemoryError>;

    /// Overwrite the region with zeros in a way that cannot be optimized out.
    ///
    /// # Safety
    /// The region must be writable.
    unsafe fn wipe(&self, addr: NonNull<u8>, len: usize);
}

/// The native platform implementation, selected when the crate is built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemPages;

impl PagePlatform for SystemPages {
    #[inline]
    fn page_size(&self) -> usize {
        default_page_size()
    }

    #[inline]
    fn allocate(&self, len: usize) -> Result<NonNull<u8>, MemoryError> {
        alloc_pages(len, default_page_size()).map(NonNull::cast)
    }

    #[inline]
    unsafe fn release(&self, addr: NonNull<u8>, len: usize) {
        unsafe { dealloc_pages(addr, len, default_page_size()) }
    }

    #[inline]
    fn lock(&self, addr: NonNull<u8>, len: usize) -> Result<(), MemoryError> {
        lock_pages(addr.as_ptr(), len)
    }

    #[inline]
    fn unlock(&self, addr: NonNull<u8>, len: usize) -> Result<(), MemoryError> {
        unlock_pages(addr.as_ptr(), len)
    }

    #[inline]
    fn protect(
        &self,
        addr: NonNull<u8>,
        len: usize,
        mode: ProtectionMode,
    ) -> Result<(), MemoryError> {
        set_page_protection(addr.as_ptr(), len, mode)
    }

    #[inline]
    unsafe fn wipe(&self, addr: NonNull<u8>, len: usize) {
        unsafe { zero::wipe(addr, len) }
    }
}
