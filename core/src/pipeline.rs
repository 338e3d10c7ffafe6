//! Request preparation and response capture over a `TransferHandle`.
//!
//! # Design
//! Every operation walks the same linear path: reset and configure the
//! handle, perform the transfer, read the status, drain the captured headers
//! and body into a fresh `HttpResponse`. The functions here take the handle
//! by `&mut` so that free functions can pass a throwaway handle and sessions
//! can pass their long-lived one; the behavior is otherwise identical.

use std::path::Path;

use tracing::debug;

use crate::archive;
use crate::compress::compress_if_large;
use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::handle::{Sink, TransferHandle, TransferOption};
use crate::http::HttpResponse;

/// Reset the handle and apply the options every request shares.
fn prepare_basic(
    handle: &mut TransferHandle,
    sink: Sink,
    url: &str,
    config: &RequestConfig,
) -> Result<()> {
    handle.reset();
    handle.configure(TransferOption::Url(url))?;
    handle.configure(TransferOption::NoProgress)?;
    handle.set_sink(sink);
    handle.configure(TransferOption::CookieEngine)?;
    handle.configure(TransferOption::Timeout(config.timeout))?;
    handle.configure(TransferOption::FollowRedirects(config.follow_redirects))?;
    Ok(())
}

/// Turn the prepared transfer into a fixed-length POST of `data`.
fn prepare_post(handle: &mut TransferHandle, data: &[u8], config: &RequestConfig) -> Result<()> {
    let (body, compressed) =
        compress_if_large(data, config.compression_threshold).map_err(Error::Compression)?;
    if compressed {
        debug!(original = data.len(), compressed = body.len(), "gzip-encoding request body");
    }

    handle.configure(TransferOption::Post)?;
    handle.configure(TransferOption::PostFields(&body))?;

    // An empty `Name:` removes the header. Expect is always suppressed so the
    // body goes out without a 100-continue round trip.
    let encoding = if compressed {
        "Content-Encoding: gzip"
    } else {
        "Content-Encoding:"
    };
    handle.configure(TransferOption::Headers(&["Expect:", encoding]))
}

/// Perform the prepared transfer and collect the response.
fn execute(handle: &mut TransferHandle, url: &str) -> Result<HttpResponse> {
    if let Err(err) = handle.perform() {
        // Release the sink now so a download target is closed promptly.
        if let Err(flush) = handle.take_capture() {
            debug!(url, error = %flush, "discarding sink error after failed transfer");
        }
        return Err(err);
    }
    let status = handle.response_code()?;
    let capture = handle.take_capture()?;
    debug!(url, status, bytes = capture.body.len(), "request complete");
    Ok(HttpResponse {
        status,
        headers: capture.headers,
        body: capture.body,
    })
}

pub(crate) fn get(
    handle: &mut TransferHandle,
    url: &str,
    config: &RequestConfig,
) -> Result<HttpResponse> {
    prepare_basic(handle, Sink::memory(), url, config)?;
    execute(handle, url)
}

pub(crate) fn post(
    handle: &mut TransferHandle,
    url: &str,
    data: &[u8],
    config: &RequestConfig,
) -> Result<HttpResponse> {
    prepare_basic(handle, Sink::memory(), url, config)?;
    prepare_post(handle, data, config)?;
    execute(handle, url)
}

/// Stream the body of `url` into `localpath`. The file is truncated before
/// the request is sent, and keeps whatever body arrives even for error
/// statuses.
pub(crate) fn download(
    handle: &mut TransferHandle,
    url: &str,
    localpath: &Path,
    config: &RequestConfig,
) -> Result<HttpResponse> {
    let sink = Sink::file(localpath)?;
    prepare_basic(handle, sink, url, config)?;
    execute(handle, url)
}

/// Download, then extract into `extractdir` only on a 200. Redirects are
/// never followed here, whatever `config` says.
pub(crate) fn download_tarball(
    handle: &mut TransferHandle,
    url: &str,
    localpath: &Path,
    extractdir: &Path,
    config: &RequestConfig,
) -> Result<HttpResponse> {
    let config = RequestConfig {
        follow_redirects: false,
        ..config.clone()
    };
    let response = download(handle, url, localpath, &config)?;
    if response.status == 200 {
        archive::extract_tarball(localpath, extractdir)?;
    } else {
        debug!(url, status = response.status, "not extracting tarball");
    }
    Ok(response)
}
