//! Parsing of raw header lines delivered by the libcurl header callback.

use std::collections::HashMap;

/// Classification of one raw header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// `HTTP/1.1 200 OK` and friends. Starts a new header block.
    Status(u16),
    /// `Name: value`, both sides trimmed.
    Field(String, String),
    /// Blank separator or anything without a colon.
    Other,
}

/// Classify a header line. Status lines are recognized before the colon
/// check so that they never end up in the header map.
pub fn parse_header_line(raw: &[u8]) -> HeaderLine {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);

    if let Some(rest) = line.strip_prefix("HTTP/") {
        let code = rest
            .split_whitespace()
            .nth(1)
            .and_then(|c| c.parse::<u16>().ok());
        if let Some(code) = code {
            return HeaderLine::Status(code);
        }
    }

    match line.split_once(':') {
        Some((name, value)) => HeaderLine::Field(name.trim().to_string(), value.trim().to_string()),
        None => HeaderLine::Other,
    }
}

/// Accumulates the headers of the final response of a transfer.
///
/// Redirects and `100 Continue` produce several header blocks; each status
/// line discards what came before it.
#[derive(Debug, Default)]
pub(crate) struct HeaderCollector {
    headers: HashMap<String, String>,
}

impl HeaderCollector {
    pub(crate) fn feed(&mut self, raw: &[u8]) {
        match parse_header_line(raw) {
            HeaderLine::Status(_) => self.headers.clear(),
            HeaderLine::Field(name, value) => {
                tracing::trace!(%name, %value, "response header");
                self.headers.insert(name, value);
            }
            HeaderLine::Other => {}
        }
    }

    pub(crate) fn take(&mut self) -> HashMap<String, String> {
        std::mem::take(&mut self.headers)
    }
}
