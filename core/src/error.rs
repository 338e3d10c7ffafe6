//! Error types for the hurl client core.
//!
//! # Design
//! Only transport-level failures are errors. A 404 or 500 is a normal
//! `HttpResponse` carrying that status. The three conditions callers most
//! often retry on (timeout, DNS resolution, connection refusal) get their own
//! variants; every other libcurl result lands in `Transport` with the raw
//! code preserved for diagnostics.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or executing a transfer.
#[derive(Debug, Error)]
pub enum Error {
    /// The transfer exceeded its configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// The host name could not be resolved.
    #[error("couldn't resolve host name")]
    Resolve,

    /// The TCP/TLS connection could not be established.
    #[error("couldn't connect to server")]
    Connect,

    /// Any other libcurl failure, including rejected options and failed
    /// metadata reads.
    #[error("transport error {code}: {message}")]
    Transport { code: i32, message: String },

    /// The tarball was downloaded but could not be extracted.
    #[error("failed to extract archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The POST body could not be gzip-encoded.
    #[error("failed to compress request body: {0}")]
    Compression(#[source] std::io::Error),

    /// A local file could not be created or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of an [`Error`], for callers that branch on the
/// category rather than the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    ResolveFailure,
    ConnectFailure,
    GenericTransportFailure,
    ArchiveExtractionFailure,
    Io,
}

impl Error {
    /// Map the result of `curl_easy_perform` onto the taxonomy.
    pub(crate) fn from_perform(err: curl::Error) -> Self {
        if err.is_operation_timedout() {
            Error::Timeout
        } else if err.is_couldnt_resolve_host() {
            Error::Resolve
        } else if err.is_couldnt_connect() {
            Error::Connect
        } else {
            Error::transport(err)
        }
    }

    /// Wrap a libcurl error verbatim. Used for option and info failures,
    /// which never get the specialised variants.
    pub(crate) fn transport(err: curl::Error) -> Self {
        Error::Transport {
            code: err.code() as i32,
            message: err.description().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout => ErrorKind::Timeout,
            Error::Resolve => ErrorKind::ResolveFailure,
            Error::Connect => ErrorKind::ConnectFailure,
            Error::Transport { .. } => ErrorKind::GenericTransportFailure,
            Error::Archive { .. } => ErrorKind::ArchiveExtractionFailure,
            Error::Compression(_) | Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// The underlying libcurl result code, when the error came from libcurl.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Timeout => Some(curl_sys::CURLE_OPERATION_TIMEDOUT as i32),
            Error::Resolve => Some(curl_sys::CURLE_COULDNT_RESOLVE_HOST as i32),
            Error::Connect => Some(curl_sys::CURLE_COULDNT_CONNECT as i32),
            Error::Transport { code, .. } => Some(*code),
            Error::Archive { .. } | Error::Compression(_) | Error::Io { .. } => None,
        }
    }
}
