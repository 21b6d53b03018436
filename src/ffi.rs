//! C-compatible interface.
//!
//! Handles are opaque pointers to a boxed [`SecureBuffer`]. Every function
//! accepts a null handle and reports it instead of faulting; none of them
//! panic or abort.

use core::ffi::{c_char, c_int, c_void, CStr};
use core::slice;

use crate::buffer::SecureBuffer;
use crate::error::{Error, SUCCESS_CODE};

/// Opaque handle to a secure buffer.
pub type LsecoHandle = *mut c_void;

/// Operation succeeded.
pub const LSECO_SUCCESS: c_int = SUCCESS_CODE;
/// A handle or data pointer was NULL.
pub const LSECO_ERR_NULL_PTR: c_int = Error::NullPointer.code();
/// Memory allocation failed.
pub const LSECO_ERR_ALLOC_FAILED: c_int = Error::AllocationFailed.code();
/// Memory could not be locked in RAM.
pub const LSECO_ERR_LOCK_FAILED: c_int = Error::LockFailed.code();
/// Memory protection could not be changed.
pub const LSECO_ERR_PROTECT_FAILED: c_int = Error::ProtectFailed.code();
/// A size or length was zero or too large.
pub const LSECO_ERR_INVALID_SIZE: c_int = Error::InvalidSize.code();

const VERSION: &CStr = match CStr::from_bytes_with_nul(
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes(),
) {
    Ok(version) => version,
    Err(_) => c"unknown",
};

#[inline]
fn result_code(result: Result<(), Error>) -> c_int {
    match result {
        Ok(()) => LSECO_SUCCESS,
        Err(err) => err.code(),
    }
}

pub(crate) fn error_cstr(code: c_int) -> &'static CStr {
    match Error::from_code(code) {
        Some(Error::NullPointer) => c"NULL pointer provided",
        Some(Error::AllocationFailed) => c"Memory allocation failed",
        Some(Error::LockFailed) => c"Failed to lock memory in RAM",
        Some(Error::ProtectFailed) => c"Failed to set memory protection",
        Some(Error::InvalidSize) => c"Invalid size parameter",
        None if code == LSECO_SUCCESS => c"Success",
        None => c"Unknown error",
    }
}

/// Create a secure buffer of `size` bytes.
///
/// Returns NULL if `size` is zero or the buffer could not be created.
/// The handle must be released with [`lseco_destroy`] or [`lseco_clear`].
#[no_mangle]
pub extern "C" fn lseco_create(size: usize) -> LsecoHandle {
    match SecureBuffer::new(size) {
        Ok(buf) => Box::into_raw(Box::new(buf)).cast(),
        Err(err) => {
            log::debug!("lseco_create({size}) failed: {err}");
            core::ptr::null_mut()
        }
    }
}

/// Copy `length` bytes from `data` into the buffer.
///
/// # Safety
/// `handle` must be NULL or a live handle from [`lseco_create`], not in use
/// by another thread. `data` must be NULL or valid for `length` bytes.
#[no_mangle]
pub unsafe extern "C" fn lseco_store(
    handle: LsecoHandle,
    data: *const c_void,
    length: usize,
) -> c_int {
    if handle.is_null() || data.is_null() {
        return LSECO_ERR_NULL_PTR;
    }
    if length == 0 {
        return LSECO_ERR_INVALID_SIZE;
    }
    let buf = unsafe { &mut *handle.cast::<SecureBuffer>() };
    let data = unsafe { slice::from_raw_parts(data.cast::<u8>(), length) };
    result_code(buf.write(data))
}

/// Copy the first `length` bytes of the buffer into `buffer`.
///
/// # Safety
/// `handle` must be NULL or a live handle from [`lseco_create`], not in use
/// by another thread. `buffer` must be NULL or valid for writes of
/// `length` bytes.
#[no_mangle]
pub unsafe extern "C" fn lseco_retrieve(
    handle: LsecoHandle,
    buffer: *mut c_void,
    length: usize,
) -> c_int {
    if handle.is_null() || buffer.is_null() {
        return LSECO_ERR_NULL_PTR;
    }
    if length == 0 {
        return LSECO_ERR_INVALID_SIZE;
    }
    let buf = unsafe { &*handle.cast::<SecureBuffer>() };
    let out = unsafe { slice::from_raw_parts_mut(buffer.cast::<u8>(), length) };
    result_code(buf.read(out))
}

/// The size requested when the buffer was created, or 0 for a NULL handle.
///
/// # Safety
/// `handle` must be NULL or a live handle from [`lseco_create`].
#[no_mangle]
pub unsafe extern "C" fn lseco_get_size(handle: LsecoHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    unsafe { &*handle.cast::<SecureBuffer>() }.len()
}

/// Zero and release a secure buffer. A NULL handle is ignored.
///
/// # Safety
/// `handle` must be NULL or a live handle from [`lseco_create`], and must
/// not be used again afterwards.
#[no_mangle]
pub unsafe extern "C" fn lseco_destroy(handle: LsecoHandle) {
    if handle.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(handle.cast::<SecureBuffer>()) });
}

/// Zero and release the secure buffer referenced by `*handle`, then set
/// `*handle` to NULL so that repeated calls do nothing.
///
/// # Safety
/// `handle` must be NULL or point to a variable holding NULL or a live
/// handle from [`lseco_create`].
#[no_mangle]
pub unsafe extern "C" fn lseco_clear(handle: *mut LsecoHandle) {
    if handle.is_null() {
        return;
    }
    let inner = unsafe { core::ptr::replace(handle, core::ptr::null_mut()) };
    unsafe { lseco_destroy(inner) };
}

/// A static, NUL-terminated description of a result code. Never NULL.
#[no_mangle]
pub extern "C" fn lseco_error_string(error_code: c_int) -> *const c_char {
    error_cstr(error_code).as_ptr()
}

/// The static, NUL-terminated library version.
#[no_mangle]
pub extern "C" fn lseco_version() -> *const c_char {
    VERSION.as_ptr()
}
