//! Cookie-preserving client session bound to a base URL.
//!
//! # Design
//! A `Session` owns exactly one `TransferHandle` for its whole life. libcurl
//! keeps the cookie store inside the handle, so every cookie set by a
//! response on this session is replayed on later requests without any
//! bookkeeping here.
//!
//! Methods take `&mut self`: one request at a time, enforced by the borrow
//! checker. A session can be moved to another thread but not shared; wrap it
//! in a `Mutex` if several tasks need it.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::config::RequestConfig;
use crate::error::Result;
use crate::handle::{TransferHandle, TransferOption};
use crate::http::HttpResponse;
use crate::params::{build_query_url, serialize, HttpParams};
use crate::pipeline;

/// A client session: one handle, one cookie jar, one base URL.
///
/// The `path` argument of each method is appended verbatim to the base URL,
/// so `Session::new("http://example.com").get("/foo", ..)` requests
/// `http://example.com/foo`.
#[derive(Debug)]
pub struct Session {
    handle: TransferHandle,
    base_url: String,
    config: RequestConfig,
}

impl Session {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, RequestConfig::default())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::with_config(base_url, RequestConfig::with_timeout(timeout))
    }

    pub fn with_config(base_url: &str, config: RequestConfig) -> Result<Self> {
        Ok(Self {
            handle: TransferHandle::new()?,
            base_url: base_url.to_string(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&mut self, path: &str, params: &HttpParams) -> Result<HttpResponse> {
        let url = build_query_url(&self.url(path), params);
        pipeline::get(&mut self.handle, &url, &self.config)
    }

    pub fn post(&mut self, path: &str, data: &[u8]) -> Result<HttpResponse> {
        let url = self.url(path);
        pipeline::post(&mut self.handle, &url, data, &self.config)
    }

    pub fn post_form(&mut self, path: &str, params: &HttpParams) -> Result<HttpResponse> {
        let body = serialize(params);
        self.post(path, body.as_bytes())
    }

    pub fn download(&mut self, path: &str, localpath: &Path) -> Result<HttpResponse> {
        let url = self.url(path);
        pipeline::download(&mut self.handle, &url, localpath, &self.config)
    }

    pub fn download_tarball(
        &mut self,
        path: &str,
        localpath: &Path,
        extractdir: &Path,
    ) -> Result<HttpResponse> {
        let url = self.url(path);
        pipeline::download_tarball(&mut self.handle, &url, localpath, extractdir, &self.config)
    }

    /// Current cookies, one per line. The format is libcurl's Netscape
    /// cookie-file line and round-trips through [`Session::set_cookie`].
    pub fn cookie(&mut self) -> Result<String> {
        let lines = self.handle.cookie_list()?;
        Ok(lines.into_iter().map(|line| line + "\n").collect())
    }

    /// Replace the session's cookies with the lines in `data`.
    ///
    /// Lines are handed to libcurl unvalidated; its parsing rules decide what
    /// a malformed line does.
    pub fn set_cookie(&mut self, data: &str) -> Result<()> {
        self.handle.configure(TransferOption::CookieEngine)?;
        self.handle.inject_cookie("ALL")?;
        let mut count = 0usize;
        for line in data.lines().filter(|line| !line.is_empty()) {
            self.handle.inject_cookie(line)?;
            count += 1;
        }
        debug!(count, "replaced session cookies");
        Ok(())
    }
}
