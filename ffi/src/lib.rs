//! C-ABI wrapper around `hurl-core`.
//!
//! # Overview
//! Exposes the one-shot request functions and the cookie-preserving session
//! through `extern "C"` functions, so any language with a C FFI can issue
//! HTTP requests without touching Rust types.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Request functions mirror the core API 1:1 and all return a single
//!   `FfiHurlResult` envelope carrying either the response or the error.
//! - Timeouts are whole seconds; 0 means no timeout.
//! - The C caller owns all returned pointers and must call the matching
//!   `hurl_free_*` or `hurl_session_free` function to release them.
//! - A session must not be used from two threads at once.

pub mod types;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Duration;

use types::*;

/// Run `body`, turning a panic into an `FfiHurlResult` error.
fn guarded(name: &str, body: impl FnOnce() -> *mut FfiHurlResult) -> *mut FfiHurlResult {
    catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|_| FfiHurlResult::panic(&format!("panic in {name}")))
}

/// Borrow the session behind `session`, or `None` if it is null.
fn session_mut<'a>(session: *mut FfiSession) -> Option<&'a mut FfiSession> {
    unsafe { session.as_mut() }
}

// ---------------------------------------------------------------------------
// One-shot requests
// ---------------------------------------------------------------------------

/// GET `url` with `params_len` query parameters.
///
/// `params` may be null when `params_len` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_get(
    url: *const c_char,
    params: *const FfiParam,
    params_len: u32,
    timeout_secs: u64,
) -> *mut FfiHurlResult {
    guarded("hurl_get", || {
        let Some(url) = borrow_str(url) else {
            return FfiHurlResult::null_arg("url");
        };
        let Some(params) = params_from_raw(params, params_len) else {
            return FfiHurlResult::null_arg("params");
        };
        FfiHurlResult::from_outcome(hurl_core::get(url, &params, Duration::from_secs(timeout_secs)))
    })
}

/// POST `data_len` raw bytes to `url`.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_post(
    url: *const c_char,
    data: *const u8,
    data_len: usize,
    timeout_secs: u64,
) -> *mut FfiHurlResult {
    guarded("hurl_post", || {
        let Some(url) = borrow_str(url) else {
            return FfiHurlResult::null_arg("url");
        };
        let Some(data) = bytes_from_raw(data, data_len) else {
            return FfiHurlResult::null_arg("data");
        };
        FfiHurlResult::from_outcome(hurl_core::post(url, data, Duration::from_secs(timeout_secs)))
    })
}

/// POST `params` to `url` as a URL-encoded form.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_post_form(
    url: *const c_char,
    params: *const FfiParam,
    params_len: u32,
    timeout_secs: u64,
) -> *mut FfiHurlResult {
    guarded("hurl_post_form", || {
        let Some(url) = borrow_str(url) else {
            return FfiHurlResult::null_arg("url");
        };
        let Some(params) = params_from_raw(params, params_len) else {
            return FfiHurlResult::null_arg("params");
        };
        FfiHurlResult::from_outcome(hurl_core::post_form(
            url,
            &params,
            Duration::from_secs(timeout_secs),
        ))
    })
}

/// Download `url` into the file at `localpath`. The result body is empty.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_download(
    url: *const c_char,
    localpath: *const c_char,
    timeout_secs: u64,
) -> *mut FfiHurlResult {
    guarded("hurl_download", || {
        let Some(url) = borrow_str(url) else {
            return FfiHurlResult::null_arg("url");
        };
        let Some(localpath) = borrow_str(localpath) else {
            return FfiHurlResult::null_arg("localpath");
        };
        FfiHurlResult::from_outcome(hurl_core::download(
            url,
            Path::new(localpath),
            Duration::from_secs(timeout_secs),
        ))
    })
}

/// Download a tarball and extract it into `extractdir` on HTTP 200.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_download_tarball(
    url: *const c_char,
    localpath: *const c_char,
    extractdir: *const c_char,
    timeout_secs: u64,
) -> *mut FfiHurlResult {
    guarded("hurl_download_tarball", || {
        let Some(url) = borrow_str(url) else {
            return FfiHurlResult::null_arg("url");
        };
        let Some(localpath) = borrow_str(localpath) else {
            return FfiHurlResult::null_arg("localpath");
        };
        let Some(extractdir) = borrow_str(extractdir) else {
            return FfiHurlResult::null_arg("extractdir");
        };
        FfiHurlResult::from_outcome(hurl_core::download_tarball(
            url,
            Path::new(localpath),
            Path::new(extractdir),
            Duration::from_secs(timeout_secs),
        ))
    })
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create a session bound to `base_url`.
///
/// Returns null on failure. When `error_out` is non-null it receives the
/// reason: `NullArg` or `InvalidUtf8` for a bad `base_url`, the transport
/// code if the transfer handle cannot be created, `Panic` otherwise, and
/// `Ok` on success. Free the session with `hurl_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_new(
    base_url: *const c_char,
    timeout_secs: u64,
    error_out: *mut FfiErrorCode,
) -> *mut FfiSession {
    let (session, code) = catch_unwind(|| {
        if base_url.is_null() {
            return (std::ptr::null_mut(), FfiErrorCode::NullArg);
        }
        let Some(base_url) = borrow_str(base_url) else {
            return (std::ptr::null_mut(), FfiErrorCode::InvalidUtf8);
        };
        match hurl_core::Session::with_timeout(base_url, Duration::from_secs(timeout_secs)) {
            Ok(inner) => (Box::into_raw(Box::new(FfiSession { inner })), FfiErrorCode::Ok),
            Err(err) => (std::ptr::null_mut(), FfiErrorCode::from(&err)),
        }
    })
    .unwrap_or((std::ptr::null_mut(), FfiErrorCode::Panic));

    if let Some(out) = unsafe { error_out.as_mut() } {
        *out = code;
    }
    session
}

/// Free a session created by `hurl_session_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(session) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Session requests
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_get(
    session: *mut FfiSession,
    path: *const c_char,
    params: *const FfiParam,
    params_len: u32,
) -> *mut FfiHurlResult {
    guarded("hurl_session_get", || {
        let Some(session) = session_mut(session) else {
            return FfiHurlResult::null_arg("session");
        };
        let Some(path) = borrow_str(path) else {
            return FfiHurlResult::null_arg("path");
        };
        let Some(params) = params_from_raw(params, params_len) else {
            return FfiHurlResult::null_arg("params");
        };
        FfiHurlResult::from_outcome(session.inner.get(path, &params))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_post(
    session: *mut FfiSession,
    path: *const c_char,
    data: *const u8,
    data_len: usize,
) -> *mut FfiHurlResult {
    guarded("hurl_session_post", || {
        let Some(session) = session_mut(session) else {
            return FfiHurlResult::null_arg("session");
        };
        let Some(path) = borrow_str(path) else {
            return FfiHurlResult::null_arg("path");
        };
        let Some(data) = bytes_from_raw(data, data_len) else {
            return FfiHurlResult::null_arg("data");
        };
        FfiHurlResult::from_outcome(session.inner.post(path, data))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_post_form(
    session: *mut FfiSession,
    path: *const c_char,
    params: *const FfiParam,
    params_len: u32,
) -> *mut FfiHurlResult {
    guarded("hurl_session_post_form", || {
        let Some(session) = session_mut(session) else {
            return FfiHurlResult::null_arg("session");
        };
        let Some(path) = borrow_str(path) else {
            return FfiHurlResult::null_arg("path");
        };
        let Some(params) = params_from_raw(params, params_len) else {
            return FfiHurlResult::null_arg("params");
        };
        FfiHurlResult::from_outcome(session.inner.post_form(path, &params))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_download(
    session: *mut FfiSession,
    path: *const c_char,
    localpath: *const c_char,
) -> *mut FfiHurlResult {
    guarded("hurl_session_download", || {
        let Some(session) = session_mut(session) else {
            return FfiHurlResult::null_arg("session");
        };
        let Some(path) = borrow_str(path) else {
            return FfiHurlResult::null_arg("path");
        };
        let Some(localpath) = borrow_str(localpath) else {
            return FfiHurlResult::null_arg("localpath");
        };
        FfiHurlResult::from_outcome(session.inner.download(path, Path::new(localpath)))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_download_tarball(
    session: *mut FfiSession,
    path: *const c_char,
    localpath: *const c_char,
    extractdir: *const c_char,
) -> *mut FfiHurlResult {
    guarded("hurl_session_download_tarball", || {
        let Some(session) = session_mut(session) else {
            return FfiHurlResult::null_arg("session");
        };
        let Some(path) = borrow_str(path) else {
            return FfiHurlResult::null_arg("path");
        };
        let Some(localpath) = borrow_str(localpath) else {
            return FfiHurlResult::null_arg("localpath");
        };
        let Some(extractdir) = borrow_str(extractdir) else {
            return FfiHurlResult::null_arg("extractdir");
        };
        FfiHurlResult::from_outcome(session.inner.download_tarball(
            path,
            Path::new(localpath),
            Path::new(extractdir),
        ))
    })
}

// ---------------------------------------------------------------------------
// Session cookies
// ---------------------------------------------------------------------------

/// Return the session's cookies, one per line.
///
/// Returns null on a null session or on failure. Free with
/// `hurl_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_cookie(session: *mut FfiSession) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(session) = session_mut(session) else {
            return std::ptr::null_mut();
        };
        match session.inner.cookie() {
            Ok(cookies) => to_c_string(cookies),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Replace the session's cookies with the newline-separated lines in `data`.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_session_set_cookie(
    session: *mut FfiSession,
    data: *const c_char,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(session) = session_mut(session) else {
            return FfiErrorCode::NullArg;
        };
        if data.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(data) = borrow_str(data) else {
            return FfiErrorCode::InvalidUtf8;
        };
        match session.inner.set_cookie(data) {
            Ok(()) => FfiErrorCode::Ok,
            Err(err) => FfiErrorCode::from(&err),
        }
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHurlResult` returned by any request function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_free_result(result: *mut FfiHurlResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHurlResult::free(result) });
}

/// Free a string returned by `hurl_session_cookie`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn hurl_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        drop(unsafe { std::ffi::CString::from_raw(s) });
    });
}
