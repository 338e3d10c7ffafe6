//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! enums with explicit discriminants. Conversion and release functions live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use hurl_core::{Error, HttpParams, HttpResponse};

/// Opaque handle to a `Session`. C callers receive a pointer to this and
/// pass it back into every `hurl_session_*` function.
pub struct FfiSession {
    pub(crate) inner: hurl_core::Session,
}

/// Error codes returned in `FfiHurlResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Timeout = 1,
    Resolve = 2,
    Connect = 3,
    Transport = 4,
    Archive = 5,
    Io = 6,
    Panic = 7,
    NullArg = 8,
    InvalidUtf8 = 9,
}

impl From<&Error> for FfiErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Timeout => FfiErrorCode::Timeout,
            Error::Resolve => FfiErrorCode::Resolve,
            Error::Connect => FfiErrorCode::Connect,
            Error::Transport { .. } => FfiErrorCode::Transport,
            Error::Archive { .. } => FfiErrorCode::Archive,
            Error::Compression(_) | Error::Io { .. } => FfiErrorCode::Io,
        }
    }
}

/// A single query or form parameter supplied by the caller. Read, never freed.
#[repr(C)]
pub struct FfiParam {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// A single response header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Result envelope for every request function.
///
/// On success `error_code` is `Ok`, `error_message` is null, and the
/// response fields are filled in; `body` is null when the body is empty.
/// On failure `error_code` names the category, `error_message` is a
/// human-readable C string, and `transport_code` carries the libcurl code
/// when there is one (0 otherwise).
#[repr(C)]
pub struct FfiHurlResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub transport_code: i32,
    pub status: u16,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

/// Lossy conversion to a C string; interior NULs are dropped.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Borrow a caller-owned C string. `None` for null or non-UTF-8 input.
pub(crate) fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Copy a caller-owned parameter array into `HttpParams`.
///
/// A zero length accepts a null pointer. Entries with a null or non-UTF-8
/// key or value make the whole array invalid.
pub(crate) fn params_from_raw(ptr: *const FfiParam, len: u32) -> Option<HttpParams> {
    if len == 0 {
        return Some(HttpParams::new());
    }
    if ptr.is_null() {
        return None;
    }
    let raw = unsafe { std::slice::from_raw_parts(ptr, len as usize) };
    raw.iter()
        .map(|p| Some((borrow_str(p.key)?.to_string(), borrow_str(p.value)?.to_string())))
        .collect()
}

/// Borrow a caller-owned byte buffer. A zero length accepts a null pointer.
pub(crate) fn bytes_from_raw<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts(ptr, len) })
}

impl FfiHurlResult {
    fn empty(error_code: FfiErrorCode, error_message: *mut c_char) -> Self {
        FfiHurlResult {
            error_code,
            error_message,
            transport_code: 0,
            status: 0,
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
            body_len: 0,
        }
    }

    /// Build a heap-allocated result from a core outcome.
    pub(crate) fn from_outcome(outcome: Result<HttpResponse, Error>) -> *mut Self {
        match outcome {
            Ok(response) => Self::ok(response),
            Err(err) => Self::from_error(&err),
        }
    }

    pub(crate) fn ok(response: HttpResponse) -> *mut Self {
        let mut result = Self::empty(FfiErrorCode::Ok, std::ptr::null_mut());
        result.status = response.status;

        if !response.headers.is_empty() {
            let headers: Box<[FfiHeader]> = response
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            result.headers_len = headers.len() as u32;
            result.headers = Box::into_raw(headers) as *mut FfiHeader;
        }

        if !response.body.is_empty() {
            let body = response.body.into_boxed_slice();
            result.body_len = body.len();
            result.body = Box::into_raw(body) as *mut u8;
        }

        Box::into_raw(Box::new(result))
    }

    pub(crate) fn from_error(err: &Error) -> *mut Self {
        let mut result = Self::empty(err.into(), to_c_string(err.to_string()));
        result.transport_code = err.code().unwrap_or(0);
        Box::into_raw(Box::new(result))
    }

    /// Build an error result for a null or unreadable argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        let msg = format!("null or invalid argument: {name}");
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::NullArg, to_c_string(msg))))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Box::into_raw(Box::new(Self::empty(FfiErrorCode::Panic, to_c_string(msg))))
    }

    /// Release everything owned by a result produced by this module.
    ///
    /// # Safety
    /// `ptr` must come from one of the constructors above and not have been
    /// freed already.
    pub(crate) unsafe fn free(ptr: *mut Self) {
        let result = unsafe { Box::from_raw(ptr) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    result.headers,
                    result.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                drop(unsafe { CString::from_raw(h.key) });
                drop(unsafe { CString::from_raw(h.value) });
            }
        }
        if !result.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(result.body, result.body_len))
            });
        }
    }
}
