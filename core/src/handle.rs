//! Owned wrapper around one libcurl easy handle.
//!
//! # Design
//! `TransferHandle` is the only place that talks to libcurl. Options go in
//! through [`TransferOption`], the transfer runs through [`perform`], and
//! metadata comes back through typed getters. Every libcurl result code is
//! translated into [`Error`] here, so nothing above this module sees a raw
//! `curl::Error`.
//!
//! Response bytes never pass through libcurl-owned buffers on their way to
//! the caller: the body callback writes into an injected [`Sink`] and the
//! header callback feeds the header parser. Both live inside the handle
//! and are drained with [`take_capture`] after the transfer.
//!
//! The handle is `Send` but not `Clone`. It may move between threads; it may
//! not be used from two at once.
//!
//! [`perform`]: TransferHandle::perform
//! [`take_capture`]: TransferHandle::take_capture

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use curl::easy::{Easy2, Handler, List, WriteError};
use tracing::debug;

use crate::error::{Error, Result};
use crate::header::HeaderCollector;
use crate::transport::HandleToken;

/// One transfer option and its value.
#[derive(Debug, Clone, Copy)]
pub enum TransferOption<'a> {
    Url(&'a str),
    /// Turn off the progress meter.
    NoProgress,
    /// Enable the in-memory cookie engine. Stays on across resets.
    CookieEngine,
    /// Whole-transfer timeout; zero means none.
    Timeout(Duration),
    Post,
    /// Fixed-length POST body, copied into the handle.
    PostFields(&'a [u8]),
    /// Extra request headers. `Name:` with no value suppresses a header
    /// libcurl would otherwise add.
    Headers(&'a [&'a str]),
    FollowRedirects(bool),
}

/// libcurl takes whole milliseconds and reads 0 as "no timeout", so a
/// nonzero bound shorter than that is rounded up instead of down.
fn transfer_timeout(timeout: Duration) -> Duration {
    if !timeout.is_zero() && timeout < Duration::from_millis(1) {
        Duration::from_millis(1)
    } else {
        timeout
    }
}

/// Destination for the response body.
#[derive(Debug, Default)]
pub enum Sink {
    #[default]
    Discard,
    Memory(Vec<u8>),
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

impl Sink {
    pub fn memory() -> Self {
        Sink::Memory(Vec::new())
    }

    /// Create or truncate `path` immediately and stream the body into it.
    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Sink::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Sink::Discard => Ok(()),
            Sink::Memory(buf) => {
                buf.extend_from_slice(data);
                Ok(())
            }
            Sink::File { writer, .. } => writer.write_all(data),
        }
    }

    fn path(&self) -> PathBuf {
        match self {
            Sink::File { path, .. } => path.clone(),
            _ => PathBuf::new(),
        }
    }

    /// Flush file sinks and return the in-memory body, if any.
    fn finish(self) -> Result<Vec<u8>> {
        match self {
            Sink::Discard => Ok(Vec::new()),
            Sink::Memory(buf) => Ok(buf),
            Sink::File { path, mut writer } => {
                writer.flush().map_err(|source| Error::Io { path, source })?;
                Ok(Vec::new())
            }
        }
    }
}

/// Callback target installed in the easy handle.
#[derive(Debug, Default)]
struct Collector {
    sink: Sink,
    headers: HeaderCollector,
    write_error: Option<io::Error>,
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        match self.sink.write_all(data) {
            Ok(()) => Ok(data.len()),
            Err(err) => {
                // A short count makes libcurl abort with CURLE_WRITE_ERROR.
                self.write_error = Some(err);
                Ok(0)
            }
        }
    }

    fn header(&mut self, data: &[u8]) -> bool {
        self.headers.feed(data);
        true
    }
}

/// Headers and body captured during one transfer.
#[derive(Debug, Default)]
pub struct Capture {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Exclusive owner of one native transfer context.
#[derive(Debug)]
pub struct TransferHandle {
    easy: Easy2<Collector>,
    _token: HandleToken,
}

impl TransferHandle {
    pub fn new() -> Result<Self> {
        let token = HandleToken::acquire();
        // Easy2::new asserts on a null handle from curl_easy_init.
        let easy = std::panic::catch_unwind(|| Easy2::new(Collector::default())).map_err(|_| {
            Error::Transport {
                code: curl_sys::CURLE_FAILED_INIT as i32,
                message: "curl_easy_init failed".to_string(),
            }
        })?;
        Ok(Self {
            easy,
            _token: token,
        })
    }

    /// Restore library defaults. Cookies already stored in the handle
    /// survive; captured response state is discarded.
    pub fn reset(&mut self) {
        self.easy.reset();
        *self.easy.get_mut() = Collector::default();
    }

    pub fn configure(&mut self, option: TransferOption<'_>) -> Result<()> {
        let easy = &mut self.easy;
        let outcome = match option {
            TransferOption::Url(url) => easy.url(url),
            TransferOption::NoProgress => easy.progress(false),
            TransferOption::CookieEngine => easy.cookie_file(""),
            TransferOption::Timeout(timeout) => easy.timeout(transfer_timeout(timeout)),
            TransferOption::Post => easy.post(true),
            TransferOption::PostFields(data) => easy
                .post_field_size(data.len() as u64)
                .and_then(|()| easy.post_fields_copy(data)),
            TransferOption::Headers(lines) => {
                let mut list = List::new();
                for line in lines {
                    list.append(line).map_err(Error::transport)?;
                }
                easy.http_headers(list)
            }
            TransferOption::FollowRedirects(follow) => easy.follow_location(follow),
        };
        outcome.map_err(Error::transport)
    }

    /// Route the next transfer's body into `sink`.
    pub fn set_sink(&mut self, sink: Sink) {
        self.easy.get_mut().sink = sink;
    }

    /// Run the configured transfer to completion on the calling thread.
    pub fn perform(&mut self) -> Result<()> {
        let outcome = self.easy.perform();
        let collector = self.easy.get_mut();
        if let Some(source) = collector.write_error.take() {
            return Err(Error::Io {
                path: collector.sink.path(),
                source,
            });
        }
        outcome.map_err(|err| {
            debug!(code = err.code(), error = %err, "transfer failed");
            Error::from_perform(err)
        })
    }

    /// Drain the headers and body captured by the last transfer, flushing
    /// file sinks. The handle is left with a discarding sink.
    pub fn take_capture(&mut self) -> Result<Capture> {
        let collector = self.easy.get_mut();
        let headers = collector.headers.take();
        let body = std::mem::take(&mut collector.sink).finish()?;
        Ok(Capture { headers, body })
    }

    pub fn response_code(&mut self) -> Result<u16> {
        let code = self.easy.response_code().map_err(Error::transport)?;
        u16::try_from(code).map_err(|_| Error::Transport {
            code: curl_sys::CURLE_RECV_ERROR as i32,
            message: format!("response code {code} out of range"),
        })
    }

    /// Cookies currently known to the handle, one Netscape-format line each.
    pub fn cookie_list(&mut self) -> Result<Vec<String>> {
        let list = self.easy.cookies().map_err(Error::transport)?;
        Ok(list
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect())
    }

    /// Hand one line to `CURLOPT_COOKIELIST`. Besides cookie lines this
    /// accepts libcurl's commands such as `ALL` and `FLUSH`.
    pub fn inject_cookie(&mut self, line: &str) -> Result<()> {
        self.easy.cookie_list(line).map_err(Error::transport)
    }
}
