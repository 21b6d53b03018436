//! Page-aligned memory regions obtained directly from the operating system.

#[cfg(miri)]
use core::alloc::Layout;
#[cfg(all(windows, not(miri)))]
use core::mem;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(all(unix, not(miri)))]
use libc::{free, posix_memalign};

#[cfg(all(windows, not(miri)))]
use windows_sys::Win32::System::{Memory, SystemInformation};

use crate::error::MemoryError;

/// Fetch the system-specific page size.
///
/// The value is read from the operating system once and cached for the
/// lifetime of the process.
pub fn default_page_size() -> usize {
    static CACHE: AtomicUsize = AtomicUsize::new(0);

    let mut size = CACHE.load(Ordering::Relaxed);

    if size == 0 {
        #[cfg(miri)]
        {
            size = 4096;
        }
        #[cfg(all(target_os = "macos", not(miri)))]
        {
            size = unsafe { libc::vm_page_size };
        }
        #[cfg(all(unix, not(target_os = "macos"), not(miri)))]
        {
            size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) } as usize;
        }
        #[cfg(all(windows, not(miri)))]
        {
            let mut sysinfo = mem::MaybeUninit::<SystemInformation::SYSTEM_INFO>::uninit();
            unsafe { SystemInformation::GetSystemInfo(sysinfo.as_mut_ptr()) };
            size = unsafe { sysinfo.assume_init_ref() }.dwPageSize as usize;
        }

        debug_assert_ne!(size, 0);
        debug_assert!(size.is_power_of_two());
        // inputs to posix_memalign must be a multiple of the pointer size
        debug_assert_eq!(size % core::mem::size_of::<*const ()>(), 0);

        CACHE.store(size, Ordering::Relaxed);
    }

    size
}

/// Round up a length of bytes to a multiple of the page size.
///
/// A zero length rounds to zero. Returns `None` if the rounded length
/// would overflow.
#[inline(always)]
pub fn page_rounded_length(len: usize, page_size: usize) -> Option<usize> {
    debug_assert!(page_size.is_power_of_two());
    len.checked_add((page_size - (len & (page_size - 1))) % page_size)
}

/// Allocate a page-aligned buffer of exactly `alloc_len` bytes, which must
/// be a non-zero multiple of `page_size`.
pub fn alloc_pages(alloc_len: usize, page_size: usize) -> Result<NonNull<[u8]>, MemoryError> {
    debug_assert!(alloc_len != 0 && alloc_len % page_size == 0);

    #[cfg(miri)]
    {
        let layout = Layout::from_size_align(alloc_len, page_size).map_err(|_| MemoryError)?;
        let addr = unsafe { std::alloc::alloc(layout) };
        let range = ptr::slice_from_raw_parts_mut(addr, alloc_len);
        NonNull::new(range).ok_or(MemoryError)
    }

    #[cfg(all(unix, not(miri)))]
    {
        let mut addr = ptr::null_mut();
        let ret = unsafe { posix_memalign(&mut addr, page_size, alloc_len) };
        if ret == 0 {
            let range = ptr::slice_from_raw_parts_mut(addr.cast::<u8>(), alloc_len);
            NonNull::new(range).ok_or(MemoryError)
        } else {
            Err(MemoryError)
        }
    }

    #[cfg(all(windows, not(miri)))]
    {
        let _ = page_size;
        let addr = unsafe {
            Memory::VirtualAlloc(
                ptr::null(),
                alloc_len,
                Memory::MEM_COMMIT | Memory::MEM_RESERVE,
                Memory::PAGE_READWRITE,
            )
        };
        let range = ptr::slice_from_raw_parts_mut(addr.cast::<u8>(), alloc_len);
        NonNull::new(range).ok_or(MemoryError)
    }
}

/// Release a buffer allocated by [`alloc_pages`].
///
/// # Safety
/// `addr` must have been returned by [`alloc_pages`] with the same
/// `alloc_len` and `page_size`, and must not be used afterwards.
pub unsafe fn dealloc_pages(addr: NonNull<u8>, alloc_len: usize, page_size: usize) {
    #[cfg(miri)]
    {
        let layout = unsafe { Layout::from_size_align_unchecked(alloc_len, page_size) };
        unsafe { std::alloc::dealloc(addr.as_ptr(), layout) };
    }

    #[cfg(all(unix, not(miri)))]
    {
        let _ = (alloc_len, page_size);
        unsafe { free(addr.as_ptr().cast()) };
    }

    #[cfg(all(windows, not(miri)))]
    {
        let _ = (alloc_len, page_size);
        unsafe { Memory::VirtualFree(addr.as_ptr().cast(), 0, Memory::MEM_RELEASE) };
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{default_page_size, page_rounded_length};

    #[rstest]
    #[case(0, 0)]
    #[case(1, 4096)]
    #[case(16, 4096)]
    #[case(4095, 4096)]
    #[case(4096, 4096)]
    #[case(4097, 8192)]
    #[case(12288, 12288)]
    fn rounded_length(#[case] len: usize, #[case] expect: usize) {
        assert_eq!(page_rounded_length(len, 4096), Some(expect));
    }

    #[test]
    fn rounded_length_overflow() {
        assert_eq!(page_rounded_length(usize::MAX, 4096), None);
        assert_eq!(page_rounded_length(usize::MAX - 4095, 4096), Some(usize::MAX - 4095));
    }

    #[test]
    fn page_size_cached() {
        let first = default_page_size();
        assert!(first.is_power_of_two());
        assert_eq!(default_page_size(), first);
    }
}
