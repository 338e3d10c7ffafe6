//! One-shot request functions.
//!
//! Each call creates its own `TransferHandle` and drops it on return, so no
//! cookies or connections carry over between calls. Use a `Session` when
//! they should.

use std::path::Path;
use std::time::Duration;

use crate::config::RequestConfig;
use crate::error::Result;
use crate::handle::TransferHandle;
use crate::http::HttpResponse;
use crate::params::{build_query_url, serialize, HttpParams};
use crate::pipeline;

/// GET `url`, with `params` appended as a query string when non-empty.
/// A zero `timeout` means no timeout.
pub fn get(url: &str, params: &HttpParams, timeout: Duration) -> Result<HttpResponse> {
    let mut handle = TransferHandle::new()?;
    let url = build_query_url(url, params);
    pipeline::get(&mut handle, &url, &RequestConfig::with_timeout(timeout))
}

/// POST raw bytes. The data is sent as-is, apart from gzip encoding when it
/// is larger than the compression threshold.
pub fn post(url: &str, data: &[u8], timeout: Duration) -> Result<HttpResponse> {
    let mut handle = TransferHandle::new()?;
    pipeline::post(&mut handle, url, data, &RequestConfig::with_timeout(timeout))
}

/// POST `params` as a URL-encoded form body.
pub fn post_form(url: &str, params: &HttpParams, timeout: Duration) -> Result<HttpResponse> {
    let body = serialize(params);
    post(url, body.as_bytes(), timeout)
}

/// GET `url` into the file at `localpath`. The returned body is empty.
pub fn download(url: &str, localpath: &Path, timeout: Duration) -> Result<HttpResponse> {
    let mut handle = TransferHandle::new()?;
    pipeline::download(&mut handle, url, localpath, &RequestConfig::with_timeout(timeout))
}

/// Download a tar archive to `localpath` and, if the server answered 200,
/// extract it into `extractdir`.
pub fn download_tarball(
    url: &str,
    localpath: &Path,
    extractdir: &Path,
    timeout: Duration,
) -> Result<HttpResponse> {
    let mut handle = TransferHandle::new()?;
    pipeline::download_tarball(
        &mut handle,
        url,
        localpath,
        extractdir,
        &RequestConfig::with_timeout(timeout),
    )
}
