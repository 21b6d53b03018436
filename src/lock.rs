//! Residency pinning, keeping secret pages out of swap and core dumps.

#[cfg(all(windows, not(miri)))]
use windows_sys::Win32::System::Memory;

use crate::error::MemoryError;

/// Prevent swapping for the given memory range.
///
/// On supported platforms, also ask for the memory to be left out of core
/// dumps. That request is advisory and its failure is only logged.
pub fn lock_pages(addr: *mut u8, len: usize) -> Result<(), MemoryError> {
    #[cfg(miri)]
    {
        _ = (addr, len);
        Ok(())
    }
    #[cfg(all(unix, not(miri)))]
    {
        let res = unsafe { libc::mlock(addr.cast(), len) };
        if res != 0 {
            return Err(MemoryError);
        }

        #[cfg(target_os = "linux")]
        dump_hint(addr, len, libc::MADV_DONTDUMP);
        #[cfg(any(target_os = "freebsd", target_os = "dragonfly"))]
        dump_hint(addr, len, libc::MADV_NOCORE);

        Ok(())
    }
    #[cfg(all(windows, not(miri)))]
    {
        let res = unsafe { Memory::VirtualLock(addr.cast(), len) };
        if res != 0 {
            Ok(())
        } else {
            Err(MemoryError)
        }
    }
}

/// Resume normal swapping behavior for the given memory range.
pub fn unlock_pages(addr: *mut u8, len: usize) -> Result<(), MemoryError> {
    #[cfg(miri)]
    {
        _ = (addr, len);
        Ok(())
    }
    #[cfg(all(unix, not(miri)))]
    {
        #[cfg(target_os = "linux")]
        dump_hint(addr, len, libc::MADV_DODUMP);
        #[cfg(any(target_os = "freebsd", target_os = "dragonfly"))]
        dump_hint(addr, len, libc::MADV_CORE);

        let res = unsafe { libc::munlock(addr.cast(), len) };
        if res == 0 {
            Ok(())
        } else {
            Err(MemoryError)
        }
    }
    #[cfg(all(windows, not(miri)))]
    {
        let res = unsafe { Memory::VirtualUnlock(addr.cast(), len) };
        if res != 0 {
            Ok(())
        } else {
            Err(MemoryError)
        }
    }
}

#[cfg(all(unix, not(miri)))]
#[allow(unused)]
#[inline]
fn dump_hint(addr: *mut u8, len: usize, advice: i32) {
    let res = unsafe { libc::madvise(addr.cast(), len, advice) };
    if res != 0 {
        log::warn!("madvise({advice}) failed for {len} bytes at {addr:p}");
    }
}
