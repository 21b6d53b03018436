//! The secure buffer handle and its lifecycle.

use core::cell::Cell;
use core::fmt;
use core::ptr::{self, NonNull};

use zeroize::{Zeroize, Zeroizing};

use crate::alloc::page_rounded_length;
use crate::error::{Error, Result};
use crate::guard::OnDrop;
use crate::platform::{PagePlatform, SystemPages};
use crate::protect::ProtectionMode;

#[derive(Debug, Copy, Clone)]
struct Region {
    addr: NonNull<u8>,
    len: usize,
    alloc_len: usize,
    page_size: usize,
    mode: ProtectionMode,
    resident: bool,
}

/// A fixed-size memory region for holding a secret.
///
/// - The memory is allocated in whole pages directly from the operating
///   system and pinned in physical memory (using `mlock`/`VirtualLock`), and
///   on Linux and FreeBSD it is excluded from core dumps.
/// - At rest the pages are inaccessible (`PROT_NONE`/`PAGE_NOACCESS`). Each
///   [`write`](Self::write) or [`read`](Self::read) grants read-write access
///   for the duration of the copy only.
/// - When destroyed or dropped, the whole region is zeroed before it is
///   released.
///
/// The handle is `Send` but not `Sync`: sharing one buffer between threads
/// requires external synchronization such as a `Mutex`.
pub struct SecureBuffer<P: PagePlatform = SystemPages> {
    region: Cell<Option<Region>>,
    platform: P,
}

// The region is exclusively owned by the handle.
unsafe impl<P: PagePlatform + Send> Send for SecureBuffer<P> {}

impl SecureBuffer {
    /// Create a new secure buffer able to hold `size` bytes.
    ///
    /// The new buffer reads as zeros until it is written.
    pub fn new(size: usize) -> Result<Self> {
        Self::new_in(size, SystemPages)
    }
}

impl<P: PagePlatform> SecureBuffer<P> {
    /// Create a new secure buffer of `size` bytes using a specific platform.
    ///
    /// If any step fails, the steps already completed are undone before the
    /// error is returned.
    pub fn new_in(size: usize, platform: P) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidSize);
        }
        let page_size = platform.page_size();
        let alloc_len = page_rounded_length(size, page_size).ok_or(Error::InvalidSize)?;

        let addr = platform.allocate(alloc_len).map_err(|_| {
            log::warn!("failed to allocate {alloc_len} bytes of secure memory");
            Error::AllocationFailed
        })?;
        let release = OnDrop::new(|| unsafe { platform.release(addr, alloc_len) });

        // fresh pages may hold stale heap contents
        unsafe { platform.wipe(addr, alloc_len) };

        platform.lock(addr, alloc_len).map_err(|_| {
            log::warn!("failed to lock {alloc_len} bytes of secure memory in RAM");
            Error::LockFailed
        })?;
        let unlock = OnDrop::new(|| {
            if platform.unlock(addr, alloc_len).is_err() {
                log::warn!("failed to unlock secure memory at {addr:p}");
            }
        });

        platform
            .protect(addr, alloc_len, ProtectionMode::NoAccess)
            .map_err(|_| {
                log::warn!("failed to protect secure memory at {addr:p}");
                Error::ProtectFailed
            })?;

        unlock.disarm();
        release.disarm();

        log::debug!("created secure buffer of {size} bytes ({alloc_len} allocated) at {addr:p}");

        Ok(Self {
            region: Cell::new(Some(Region {
                addr,
                len: size,
                alloc_len,
                page_size,
                mode: ProtectionMode::NoAccess,
                resident: true,
            })),
            platform,
        })
    }

    /// Copy `data` into the start of the buffer.
    ///
    /// The length of `data` must be between 1 and [`len`](Self::len) bytes.
    /// Bytes beyond the end of `data` keep their previous contents.
    ///
    /// If the pages cannot be made accessible, the contents are unchanged and
    /// [`Error::ProtectFailed`] is returned. If access cannot be revoked
    /// after the copy, the buffer is destroyed and the same error is returned.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let region = self.checked_region(data.len())?;
        self.with_access(region, |addr| unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), addr.as_ptr(), data.len());
        })
    }

    /// Copy the first `out.len()` bytes of the buffer into `out`.
    ///
    /// The length of `out` must be between 1 and [`len`](Self::len) bytes.
    /// Failures are handled as for [`write`](Self::write); if the copy was
    /// made but access could not be revoked, `out` is zeroed as well.
    pub fn read(&self, out: &mut [u8]) -> Result<()> {
        let region = self.checked_region(out.len())?;
        let mut copied = false;
        let result = self.with_access(region, |addr| {
            unsafe { ptr::copy_nonoverlapping(addr.as_ptr(), out.as_mut_ptr(), out.len()) };
            copied = true;
        });
        if result.is_err() && copied {
            out.zeroize();
        }
        result
    }

    /// Read the first `len` bytes of the buffer into a vector which is
    /// zeroed when dropped.
    pub fn read_to_vec(&self, len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.checked_region(len)?;
        let mut out = Zeroizing::new(vec![0u8; len]);
        self.read(&mut out)?;
        Ok(out)
    }

    /// The number of bytes requested when the buffer was created, or zero
    /// if it has been destroyed.
    #[inline]
    pub fn len(&self) -> usize {
        self.region.get().map_or(0, |r| r.len)
    }

    /// Check whether the buffer holds no bytes, which is only the case
    /// once it has been destroyed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The size of the underlying allocation, always a whole number of
    /// pages, or zero if the buffer has been destroyed.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.get().map_or(0, |r| r.alloc_len)
    }

    /// The page size recorded when the buffer was created, or zero if the
    /// buffer has been destroyed.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.region.get().map_or(0, |r| r.page_size)
    }

    /// Check whether the buffer has been destroyed.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.region.get().is_none()
    }

    /// Zero the contents and release the memory.
    ///
    /// This never fails. Calling it again, or on a buffer that was
    /// destroyed after a failed access, does nothing. The buffer is also
    /// destroyed automatically when dropped.
    pub fn destroy(&mut self) {
        self.dispose();
    }

    fn checked_region(&self, len: usize) -> Result<Region> {
        let region = self.region.get().ok_or(Error::NullPointer)?;
        if len == 0 || len > region.len {
            return Err(Error::InvalidSize);
        }
        Ok(region)
    }

    fn set_mode(&self, region: &mut Region, mode: ProtectionMode) -> Result<()> {
        self.platform
            .protect(region.addr, region.alloc_len, mode)
            .map_err(|_| Error::ProtectFailed)?;
        region.mode = mode;
        self.region.set(Some(*region));
        Ok(())
    }

    fn with_access(&self, mut region: Region, f: impl FnOnce(NonNull<u8>)) -> Result<()> {
        if let Err(err) = self.set_mode(&mut region, ProtectionMode::ReadWrite) {
            log::warn!("failed to unprotect secure memory at {:p}", region.addr);
            return Err(err);
        }

        f(region.addr);

        if let Err(err) = self.set_mode(&mut region, ProtectionMode::NoAccess) {
            log::error!(
                "failed to restore protection of secure memory at {:p}, destroying",
                region.addr
            );
            self.dispose();
            return Err(err);
        }
        Ok(())
    }

    fn dispose(&self) {
        let Some(region) = self.region.take() else {
            return;
        };
        let Region {
            addr, alloc_len, ..
        } = region;

        if region.mode != ProtectionMode::ReadWrite
            && self
                .platform
                .protect(addr, alloc_len, ProtectionMode::ReadWrite)
                .is_err()
        {
            // The pages cannot be wiped or handed back while inaccessible.
            // They stay pinned and unreadable for the life of the process.
            log::error!("failed to unprotect secure memory at {addr:p}, leaking {alloc_len} bytes");
            return;
        }

        unsafe { self.platform.wipe(addr, alloc_len) };

        if region.resident && self.platform.unlock(addr, alloc_len).is_err() {
            log::warn!("failed to unlock secure memory at {addr:p}");
        }

        unsafe { self.platform.release(addr, alloc_len) };

        log::debug!("destroyed secure buffer at {addr:p}");
    }
}

impl<P: PagePlatform> Drop for SecureBuffer<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<P: PagePlatform> fmt::Debug for SecureBuffer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
