//! Guaranteed zeroing of memory regions.

use core::ptr::NonNull;
use core::slice;

use zeroize::Zeroize;

/// Overwrite `len` bytes at `addr` with zeros.
///
/// The writes are volatile and followed by a compiler fence (via `zeroize`),
/// so they survive even when the region is released immediately afterwards.
///
/// # Safety
/// The range must be valid for writes and currently accessible.
#[inline]
pub unsafe fn wipe(addr: NonNull<u8>, len: usize) {
    if len > 0 {
        let mem = unsafe { slice::from_raw_parts_mut(addr.as_ptr(), len) };
        mem.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use super::wipe;

    #[test]
    fn wipe_all_bytes() {
        let mut data = [0xa5u8; 97];
        unsafe { wipe(NonNull::from(&mut data).cast(), data.len()) };
        assert!(data.iter().all(|b| *b == 0));
    }

    #[test]
    fn wipe_prefix_only() {
        let mut data = [0xa5u8; 8];
        unsafe { wipe(NonNull::from(&mut data).cast(), 3) };
        assert_eq!(data, [0, 0, 0, 0xa5, 0xa5, 0xa5, 0xa5, 0xa5]);
    }
}
