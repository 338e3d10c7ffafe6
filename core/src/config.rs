//! Per-request settings shared by the free functions and sessions.

use std::time::Duration;

use crate::compress::DEFAULT_COMPRESSION_THRESHOLD;

/// Knobs applied to every request made with this configuration.
///
/// The compression threshold and the redirect policy were fixed constants
/// in earlier revisions; they are kept as defaults here but can be changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Bound on the whole transfer. `Duration::ZERO` blocks indefinitely.
    pub timeout: Duration,
    /// POST bodies longer than this are sent gzip-encoded.
    pub compression_threshold: usize,
    /// Follow `Location` on 3xx responses. Tarball downloads ignore this
    /// and never follow.
    pub follow_redirects: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            follow_redirects: false,
        }
    }
}

impl RequestConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}
