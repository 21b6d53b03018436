#![cfg(feature = "ffi")]

use core::ffi::{c_void, CStr};
use core::ptr;

use lseco::ffi::*;

fn c_str(ptr: *const core::ffi::c_char) -> &'static str {
    assert!(!ptr.is_null());
    unsafe { CStr::from_ptr(ptr) }.to_str().expect("invalid utf-8")
}

#[test]
fn version() {
    let version = c_str(lseco_version());
    assert!(!version.is_empty());
    assert_eq!(version, lseco::version());
}

#[test]
fn error_strings() {
    assert_eq!(c_str(lseco_error_string(LSECO_SUCCESS)), "Success");
    assert_eq!(
        c_str(lseco_error_string(LSECO_ERR_NULL_PTR)),
        "NULL pointer provided"
    );
    for code in [
        LSECO_ERR_ALLOC_FAILED,
        LSECO_ERR_LOCK_FAILED,
        LSECO_ERR_PROTECT_FAILED,
        LSECO_ERR_INVALID_SIZE,
    ] {
        assert!(!c_str(lseco_error_string(code)).is_empty());
    }
    assert_eq!(c_str(lseco_error_string(-999)), "Unknown error");
}

#[test]
fn create_and_destroy() {
    assert!(lseco_create(0).is_null());

    let handle = lseco_create(256);
    assert!(!handle.is_null());
    assert_eq!(unsafe { lseco_get_size(handle) }, 256);
    unsafe { lseco_destroy(handle) };

    unsafe { lseco_destroy(ptr::null_mut()) };
    assert_eq!(unsafe { lseco_get_size(ptr::null_mut()) }, 0);
}

#[test]
fn store_and_retrieve() {
    let handle = lseco_create(256);
    assert!(!handle.is_null());
    let secret = b"MySecretPassword123!\0";
    let mut out = [0u8; 256];

    unsafe {
        assert_eq!(
            lseco_store(ptr::null_mut(), secret.as_ptr().cast(), 4),
            LSECO_ERR_NULL_PTR
        );
        assert_eq!(lseco_store(handle, ptr::null(), 4), LSECO_ERR_NULL_PTR);
        assert_eq!(
            lseco_store(handle, secret.as_ptr().cast(), 0),
            LSECO_ERR_INVALID_SIZE
        );
        assert_eq!(
            lseco_store(handle, secret.as_ptr().cast(), secret.len()),
            LSECO_SUCCESS
        );

        assert_eq!(
            lseco_retrieve(ptr::null_mut(), out.as_mut_ptr().cast(), out.len()),
            LSECO_ERR_NULL_PTR
        );
        assert_eq!(
            lseco_retrieve(handle, ptr::null_mut(), out.len()),
            LSECO_ERR_NULL_PTR
        );
        assert_eq!(
            lseco_retrieve(handle, out.as_mut_ptr().cast(), 0),
            LSECO_ERR_INVALID_SIZE
        );
        assert_eq!(
            lseco_retrieve(handle, out.as_mut_ptr().cast(), secret.len()),
            LSECO_SUCCESS
        );
        lseco_destroy(handle);
    }
    assert_eq!(&out[..secret.len()], secret);
}

#[test]
fn size_limits() {
    let handle = lseco_create(16);
    assert!(!handle.is_null());
    let large = [b'A'; 48];
    let mut out = [0u8; 48];
    unsafe {
        assert_eq!(
            lseco_store(handle, large.as_ptr().cast(), large.len()),
            LSECO_ERR_INVALID_SIZE
        );
        assert_eq!(
            lseco_retrieve(handle, out.as_mut_ptr().cast(), out.len()),
            LSECO_ERR_INVALID_SIZE
        );
        assert_eq!(
            lseco_store(handle, b"small\0".as_ptr().cast(), 6),
            LSECO_SUCCESS
        );
        lseco_destroy(handle);
    }
}

#[test]
fn multiple_operations() {
    let handle = lseco_create(1024);
    assert!(!handle.is_null());
    let mut out = [0u8; 64];
    for data in [
        &b"FirstSecret\0"[..],
        &b"SecondSecret\0"[..],
        &b"ThirdSecret123\0"[..],
    ] {
        unsafe {
            assert_eq!(
                lseco_store(handle, data.as_ptr().cast(), data.len()),
                LSECO_SUCCESS
            );
            assert_eq!(
                lseco_retrieve(handle, out.as_mut_ptr().cast(), data.len()),
                LSECO_SUCCESS
            );
        }
        assert_eq!(&out[..data.len()], data);
    }
    unsafe { lseco_destroy(handle) };
}

#[test]
fn clear_is_idempotent() {
    let mut handle = lseco_create(32);
    assert!(!handle.is_null());
    unsafe {
        lseco_clear(&mut handle);
        assert!(handle.is_null());
        lseco_clear(&mut handle);
        lseco_clear(ptr::null_mut::<*mut c_void>());
    }
    assert!(handle.is_null());
}
