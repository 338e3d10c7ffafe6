//! Process-wide libcurl lifecycle.
//!
//! # Design
//! libcurl requires `curl_global_init` before the first easy handle exists.
//! `init` runs it exactly once per process, no matter how many sessions or
//! free-function calls follow. Every `TransferHandle` calls it on creation,
//! and callers may also call it up front to pay the cost at startup.
//!
//! There is no teardown call: the `curl` crate cannot re-initialize after
//! `curl_global_cleanup`, so global state is released at process exit. The
//! live-handle counter exists so that the one-init/many-handles relationship
//! can be observed and tested.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use tracing::debug;

static INIT: Once = Once::new();
static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Initialize libcurl for this process. Idempotent.
pub fn init() {
    INIT.call_once(|| {
        curl::init();
        debug!(version = curl::Version::get().version(), "libcurl initialized");
    });
}

/// Whether [`init`] has completed.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

/// Number of `TransferHandle`s currently alive in this process.
pub fn live_handles() -> usize {
    LIVE_HANDLES.load(Ordering::SeqCst)
}

/// Registration held by each live handle.
#[derive(Debug)]
pub(crate) struct HandleToken(());

impl HandleToken {
    pub(crate) fn acquire() -> Self {
        init();
        LIVE_HANDLES.fetch_add(1, Ordering::SeqCst);
        HandleToken(())
    }
}

impl Drop for HandleToken {
    fn drop(&mut self) {
        LIVE_HANDLES.fetch_sub(1, Ordering::SeqCst);
    }
}
