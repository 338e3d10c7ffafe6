//! Minimal blocking HTTP client built on libcurl.
//!
//! # Overview
//! GET and POST (raw or form-encoded), downloads to a local file, and tarball
//! downloads with extraction, either as one-shot free functions or through a
//! cookie-preserving [`Session`] bound to a base URL.
//!
//! # Design
//! - [`TransferHandle`] owns one libcurl easy handle and is the only code
//!   that sees libcurl result codes; they become [`Error`] values there.
//! - The request pipeline resets the handle before every request, so no
//!   option leaks from one call into the next. Cookies are the exception:
//!   the cookie engine is sticky and lives as long as the handle.
//! - HTTP error statuses are ordinary responses. Only transport failures,
//!   local I/O failures and archive extraction failures are errors.
//! - Everything is synchronous. A handle is used by one thread at a time;
//!   independent handles may run in parallel.

pub mod archive;
pub mod compress;
pub mod config;
pub mod error;
pub mod handle;
pub mod header;
pub mod http;
pub mod params;
mod pipeline;
pub mod request;
pub mod session;
pub mod transport;

pub use config::RequestConfig;
pub use error::{Error, ErrorKind, Result};
pub use handle::{Sink, TransferHandle, TransferOption};
pub use http::HttpResponse;
pub use params::{build_query_url, serialize, HttpParams};
pub use request::{download, download_tarball, get, post, post_form};
pub use session::Session;
